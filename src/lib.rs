//! wotc - a W3C Web of Things Thing Description compiler.
//!
//! The crate turns layered Thing Model documents into static C
//! configuration for an embedded WoT runtime. The pipeline has three
//! stages, each usable on its own:
//!
//! 1. **Composition** ([`compose`]): placeholder substitution, resolution
//!    of `extends` template chains, instance-metadata and protocol-binding
//!    overlays, and finalization into one canonical [`document::Document`].
//! 2. **Validation** ([`validate`]): structural invariants of the composed
//!    document, reported together as [`error::Violation`]s.
//! 3. **Lowering** ([`model`], [`lower`]): decoding into the typed
//!    [`model::Thing`] and building the [`graph::RecordGraph`], an
//!    immutable tree of named records with deterministic names and
//!    `NULL`-terminated linked sequences.
//!
//! The [`emit`] and [`coap`] modules render a graph as a C translation
//! unit with a gcoap resource table around it.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use wotc::{compile, CompileSettings, ComposeOptions};
//! use wotc::fetch::DefaultLoader;
//!
//! let model = json!({
//!     "title": "Temperature Sensor",
//!     "properties": {
//!         "temperature": {
//!             "type": "number",
//!             "forms": [{"op": "readproperty", "href": "/temp"}]
//!         }
//!     },
//!     "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
//!     "security": "nosec_sc"
//! });
//!
//! let compilation = compile(
//!     vec![(model, None)],
//!     &ComposeOptions::default(),
//!     &DefaultLoader::new(),
//!     &CompileSettings::default(),
//! ).unwrap();
//! assert_eq!(compilation.graph.records().last().unwrap().name, "wot_td_thing");
//! ```

pub mod cli;
pub mod coap;
pub mod compose;
pub mod document;
pub mod emit;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod lower;
pub mod model;
pub mod resolver;
pub mod validate;

use serde_json::Value;

pub use compose::{compose, compose_all, ComposeOptions};
pub use error::{Result, WotError};
pub use fetch::{Locator, TemplateLoader};
pub use graph::RecordGraph;
pub use model::Thing;

/// Knobs that shape the generated identifiers.
#[derive(Debug, Clone)]
pub struct CompileSettings {
    /// Prefix for every generated type and record name.
    pub namespace: String,
    /// Language assumed when no `@language` context entry is present.
    pub default_language: String,
}

impl Default for CompileSettings {
    fn default() -> Self {
        CompileSettings { namespace: "wot_td".to_string(), default_language: "en".to_string() }
    }
}

/// Everything the pipeline produced, so callers can pick the stage they
/// need: the canonical document, the typed thing, or the record graph.
#[derive(Debug)]
pub struct Compilation {
    pub document: document::Document,
    pub thing: Thing,
    pub graph: RecordGraph,
}

/// Runs the full pipeline over in-memory models.
///
/// Each model is paired with the locator it was loaded from, which anchors
/// relative `extends` targets; `None` means relative targets cannot be
/// resolved. This function performs no I/O beyond what `loader` does for
/// extension chains.
///
/// # Errors
///
/// Any composition, validation, or lowering failure; see
/// [`error::WotError`].
pub fn compile(
    models: Vec<(Value, Option<Locator>)>,
    options: &ComposeOptions,
    loader: &dyn TemplateLoader,
    settings: &CompileSettings,
) -> Result<Compilation> {
    let document = compose_all(models, options, loader)?;
    validate::validate(&document)?;
    let thing = Thing::from_document(&document, &settings.default_language)?;
    let graph = lower::build(&thing, &settings.namespace)?;
    Ok(Compilation { document, thing, graph })
}
