//! Loading input documents from files and URLs.
//!
//! Extension templates referenced through an `extends` link can live next
//! to the base template on disk or behind an absolute network location.
//! [`TemplateLoader`] is the seam between the composition pipeline and the
//! outside world: the pipeline only ever asks a loader for the JSON behind
//! a [`Locator`], so tests can swap in an in-memory loader and the CLI uses
//! [`DefaultLoader`] (filesystem plus a blocking HTTP client).
//!
//! Fetches are blocking with no retry, timeout or caching: a failed fetch
//! aborts composition.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Result, WotError};

/// Where a document lives: a filesystem path or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A local file.
    Path(PathBuf),
    /// An absolute `http://` or `https://` URL.
    Url(String),
}

impl Locator {
    /// Interprets a CLI-supplied spec: absolute URLs stay URLs, anything
    /// else is a path resolved against `base_dir` when given.
    pub fn parse(spec: &str, base_dir: Option<&Path>) -> Self {
        if is_url(spec) {
            return Self::Url(spec.to_string());
        }
        let path = PathBuf::from(spec);
        match base_dir {
            Some(base) if path.is_relative() => Self::Path(base.join(path)),
            _ => Self::Path(path),
        }
    }

    /// Resolves an `href` found inside the document behind `self`.
    ///
    /// Absolute URLs win outright; relative references resolve against the
    /// referring document's directory (for files) or its URL up to the last
    /// slash (for network locations).
    pub fn join(&self, href: &str) -> Self {
        if is_url(href) {
            return Self::Url(href.to_string());
        }
        match self {
            Self::Path(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                Self::Path(dir.join(href))
            }
            Self::Url(url) => {
                let base = match url.rfind('/') {
                    // Keep the authority intact when the URL has no path yet.
                    Some(i) if i > url.find("://").map_or(0, |s| s + 2) => &url[..=i],
                    _ => url.as_str(),
                };
                Self::Url(format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/')))
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

fn is_url(spec: &str) -> bool {
    spec.starts_with("http://") || spec.starts_with("https://")
}

/// Source of raw template JSON, keyed by [`Locator`].
pub trait TemplateLoader {
    /// Loads and parses the document behind `locator`.
    ///
    /// # Errors
    ///
    /// [`WotError::DocumentRead`] when the bytes cannot be obtained,
    /// [`WotError::MalformedInputDocument`] when they are not valid JSON.
    fn load(&self, locator: &Locator) -> Result<Value>;
}

/// Filesystem + blocking HTTP loader used by the CLI.
#[derive(Debug, Default)]
pub struct DefaultLoader {
    client: reqwest::blocking::Client,
}

impl DefaultLoader {
    /// Creates a loader with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateLoader for DefaultLoader {
    fn load(&self, locator: &Locator) -> Result<Value> {
        let text = match locator {
            Locator::Path(path) => std::fs::read_to_string(path).map_err(|e| WotError::DocumentRead {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?,
            Locator::Url(url) => self
                .client
                .get(url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .and_then(reqwest::blocking::Response::text)
                .map_err(|e| WotError::DocumentRead { locator: locator.to_string(), reason: e.to_string() })?,
        };

        serde_json::from_str(&text).map_err(|e| WotError::MalformedInputDocument {
            location: Some(locator.to_string()),
            reason: format!("invalid JSON: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn relative_paths_resolve_against_the_referring_document() {
        let base = Locator::Path(PathBuf::from("/app/models/base.tm.json"));
        assert_eq!(base.join("common.tm.json"), Locator::Path(PathBuf::from("/app/models/common.tm.json")));
    }

    #[test]
    fn relative_hrefs_resolve_against_the_base_url() {
        let base = Locator::Url("https://example.org/models/base.tm.json".into());
        assert_eq!(base.join("common.tm.json"), Locator::Url("https://example.org/models/common.tm.json".into()));
    }

    #[test]
    fn absolute_urls_win_over_any_base() {
        let base = Locator::Path(PathBuf::from("/app/base.tm.json"));
        assert_eq!(base.join("https://example.org/x.json"), Locator::Url("https://example.org/x.json".into()));
    }

    #[test]
    fn loads_and_parses_local_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({"title": "Base"})).unwrap();

        let loader = DefaultLoader::new();
        let value = loader.load(&Locator::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(value, json!({"title": "Base"}));
    }

    #[test]
    fn missing_files_report_the_locator() {
        let loader = DefaultLoader::new();
        let err = loader.load(&Locator::Path(PathBuf::from("/does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, WotError::DocumentRead { .. }));
        assert!(err.to_string().contains("/does/not/exist.json"));
    }

    #[test]
    fn invalid_json_is_a_malformed_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let loader = DefaultLoader::new();
        let err = loader.load(&Locator::Path(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, WotError::MalformedInputDocument { .. }));
    }
}
