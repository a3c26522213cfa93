//! Command-line interface.
//!
//! The binary has one job: read the layered input documents, run the
//! pipeline, and write the generated C file. Document arguments accept
//! either filesystem paths or http(s) URLs.
//!
//! ```bash
//! wotc thing_model.json extra_model.json \
//!     --meta wot_td_meta.json \
//!     --bindings wot_coap.json \
//!     --placeholders placeholders.json \
//!     --output wot_coap_config.c
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::info;

use crate::fetch::{DefaultLoader, Locator, TemplateLoader};
use crate::{coap, compile, CompileSettings, ComposeOptions};

/// Generates WoT CoAP configuration C code from Thing Model documents.
#[derive(Debug, Parser)]
#[command(name = "wotc", version, about)]
pub struct Cli {
    /// Thing Model documents (paths or URLs); the first is the base, later
    /// ones are merged into it
    #[arg(required = true, value_name = "MODEL")]
    pub models: Vec<String>,

    /// Instance metadata document
    #[arg(long, value_name = "DOC")]
    pub meta: Option<String>,

    /// Protocol bindings document
    #[arg(long, value_name = "DOC")]
    pub bindings: Option<String>,

    /// JSON object mapping placeholder names to replacement strings
    #[arg(long, value_name = "DOC")]
    pub placeholders: Option<String>,

    /// Where to write the generated C file
    #[arg(long, short, value_name = "FILE", default_value = "wot_coap_config.c")]
    pub output: PathBuf,

    /// Language assumed when the model declares no @language
    #[arg(long, value_name = "TAG", default_value = "en")]
    pub default_lang: String,

    /// Prefix for generated type and record names
    #[arg(long, value_name = "PREFIX", default_value = "wot_td")]
    pub namespace: String,
}

impl Cli {
    /// Runs the compiler end to end.
    pub fn execute(&self) -> anyhow::Result<()> {
        let loader = DefaultLoader::new();

        let mut models = Vec::with_capacity(self.models.len());
        for spec in &self.models {
            let locator = Locator::parse(spec, None);
            let model = loader.load(&locator).with_context(|| format!("loading model {spec}"))?;
            models.push((model, Some(locator)));
        }

        let options = ComposeOptions {
            meta: self.load_optional(&loader, self.meta.as_deref())?,
            bindings: self.load_optional(&loader, self.bindings.as_deref())?,
            placeholders: self.load_placeholders(&loader)?,
        };
        let settings = CompileSettings {
            namespace: self.namespace.clone(),
            default_language: self.default_lang.clone(),
        };

        let compilation = compile(models, &options, &loader, &settings)?;
        let output = coap::generate(&compilation.thing, &compilation.graph)?;

        std::fs::write(&self.output, output)
            .with_context(|| format!("writing {}", self.output.display()))?;
        info!(output = %self.output.display(), "configuration written");
        Ok(())
    }

    fn load_optional(
        &self,
        loader: &DefaultLoader,
        spec: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        match spec {
            None => Ok(None),
            Some(spec) => {
                let value = loader
                    .load(&Locator::parse(spec, None))
                    .with_context(|| format!("loading {spec}"))?;
                Ok(Some(value))
            }
        }
    }

    fn load_placeholders(&self, loader: &DefaultLoader) -> anyhow::Result<BTreeMap<String, String>> {
        let Some(raw) = self.load_optional(loader, self.placeholders.as_deref())? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_value(raw).context("placeholders must be a flat object of strings")
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn arguments_are_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_target_the_riot_namespace() {
        let cli = Cli::parse_from(["wotc", "model.json"]);
        assert_eq!(cli.namespace, "wot_td");
        assert_eq!(cli.default_lang, "en");
        assert_eq!(cli.output, PathBuf::from("wot_coap_config.c"));
    }

    #[test]
    fn multiple_models_are_positional() {
        let cli = Cli::parse_from(["wotc", "a.json", "b.json", "--meta", "meta.json"]);
        assert_eq!(cli.models, vec!["a.json".to_string(), "b.json".to_string()]);
        assert_eq!(cli.meta.as_deref(), Some("meta.json"));
    }
}
