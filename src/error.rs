//! Error handling for wotc.
//!
//! The compiler fails loudly and early: any condition that would bake a
//! silently-wrong table into the generated C data is a hard error, since the
//! target device cannot correct it at runtime. Only two conditions are
//! recoverable and handled with a [`tracing`] warning instead of an error:
//! an unparseable date-time (the field is omitted) and a default-language /
//! singular-value mismatch in a multilingual field (the map wins).
//!
//! Errors fall into four stages:
//! - **Input**: [`WotError::MalformedInputDocument`], [`WotError::DocumentRead`]
//! - **Composition**: [`WotError::UnresolvedPlaceholder`],
//!   [`WotError::InvalidPlaceholderName`], [`WotError::MissingExtensionTarget`],
//!   [`WotError::ExtensionFetchFailed`], [`WotError::CircularExtension`]
//! - **Validation**: [`WotError::ValidationFailed`] carrying every
//!   [`Violation`] found in one pass
//! - **Lowering**: [`WotError::UnsupportedFieldValue`],
//!   [`WotError::InvalidTimezoneOffset`], [`WotError::MissingDefaultLanguage`],
//!   [`WotError::MissingFormHref`]

use thiserror::Error;

/// All failure modes of the Thing Description compiler.
#[derive(Error, Debug)]
pub enum WotError {
    /// An input document could not be read from its locator.
    #[error("failed to read document from {locator}: {reason}")]
    DocumentRead {
        /// Path or URL the document was requested from.
        locator: String,
        /// Underlying I/O or HTTP failure.
        reason: String,
    },

    /// An input document is not valid JSON, or a field has the wrong shape.
    #[error("malformed input document{}: {reason}", location_suffix(.location))]
    MalformedInputDocument {
        /// Locator or JSON pointer of the offending value, when known.
        location: Option<String>,
        /// What was wrong with it.
        reason: String,
    },

    /// A `{{NAME}}` token survived placeholder substitution.
    #[error("unresolved placeholder remains in document near: {context}")]
    UnresolvedPlaceholder {
        /// Snippet of the serialized document around the leftover token.
        context: String,
    },

    /// A placeholder key does not match `[A-Z0-9_]+`.
    #[error("invalid placeholder name '{name}': placeholders must match [A-Z0-9_]+")]
    InvalidPlaceholderName {
        /// The offending key.
        name: String,
    },

    /// A link with an `extends` relation has no `href`.
    #[error("extension link has no href")]
    MissingExtensionTarget,

    /// An extension template could not be loaded.
    #[error("failed to fetch extension template from {locator}: {reason}")]
    ExtensionFetchFailed {
        /// Where the template was expected.
        locator: String,
        /// Underlying failure.
        reason: String,
    },

    /// An `extends` chain revisited a template it already loaded.
    #[error("circular 'extends' chain: {locator} was already visited")]
    CircularExtension {
        /// The locator that closed the cycle.
        locator: String,
    },

    /// The composed document violated one or more structural invariants.
    ///
    /// All violations found in one validation pass are reported together.
    #[error("document validation failed:\n{}", format_violations(.violations))]
    ValidationFailed {
        /// Every violation found, in document order.
        violations: Vec<Violation>,
    },

    /// A field carries a value outside its closed enumeration set
    /// (operation type, media type, content coding, security scheme, ...).
    #[error("unsupported value '{value}' for field '{field}'")]
    UnsupportedFieldValue {
        /// The field whose value was not recognized.
        field: String,
        /// The value that was rejected.
        value: String,
    },

    /// A date-time carries a UTC offset outside ±14 hours.
    #[error("timezone offset of {minutes} minutes is outside the allowed range of ±840 (±14:00)")]
    InvalidTimezoneOffset {
        /// The offending offset in minutes.
        minutes: i64,
    },

    /// A multilingual map has no entry for the default language and no
    /// singular value to promote.
    #[error("no '{field}' entry for default language '{language}' and no singular value given")]
    MissingDefaultLanguage {
        /// The multilingual field (e.g. `titles`).
        field: String,
        /// The active default language tag.
        language: String,
    },

    /// A form is missing its mandatory `href`.
    #[error("form in '{owner}' has no href")]
    MissingFormHref {
        /// Record name of the form's owner.
        owner: String,
    },

    /// Two forms map the same href to different handler functions, or reuse
    /// a CoAP method already claimed for that href.
    #[error("conflicting CoAP resource for href '{href}': {reason}")]
    ResourceConflict {
        /// The contested href.
        href: String,
        /// Which part of the mapping clashed.
        reason: String,
    },
}

/// One structural invariant breach found by the validator.
///
/// Carried inside [`WotError::ValidationFailed`]; the validator keeps going
/// after the first hit so a caller sees every problem at once.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Violation {
    /// An identifier in an affordance map's `required` list is not a key of
    /// that map.
    #[error("required {kind} '{name}' is not defined")]
    MissingRequiredAffordance {
        /// Affordance map kind (`properties`, `actions` or `events`).
        kind: &'static str,
        /// The missing identifier.
        name: String,
    },

    /// A security reference does not resolve to a security definition.
    #[error("security reference '{name}' ({at}) has no matching definition")]
    UnknownSecurityReference {
        /// The dangling scheme name.
        name: String,
        /// Where the reference appeared (thing level or a form).
        at: String,
    },

    /// The same affordance key appears in more than one affordance map.
    #[error("affordance name '{name}' is used by both {first} and {second}")]
    DuplicateAffordanceName {
        /// The reused key.
        name: String,
        /// Map that defined it first.
        first: &'static str,
        /// Map that reused it.
        second: &'static str,
    },
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(loc) => format!(" ({loc})"),
        None => String::new(),
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("  - {v}")).collect::<Vec<_>>().join("\n")
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, WotError>;
