//! Configuration loading: a read-only snapshot of tenant URL, credentials, index map,
//! query filter, chunk size and sort-modifier suppressions, loaded from JSON with
//! `${NAME}`/`${NAME-DEFAULT}` environment substitution applied before structural parsing.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or resolving a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unresolved placeholder ${{{name}}} with no default")]
    UnresolvedPlaceholder { name: String },
}

/// Suppressible sort-index modifier categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierCategory {
    Missing,
    Relation,
    Case,
}

/// Default credentials carried in the configuration; either field may be absent and
/// overridden per session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Read-only configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Back-end base URL.
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Optional distinct URL for a secondary query endpoint.
    #[serde(rename = "queryUrl", default)]
    pub query_url: Option<String>,

    /// Tenant name.
    pub tenant: String,

    /// Default credentials, overridable per session.
    #[serde(default)]
    pub credentials: Credentials,

    /// Mapping from BIB-1 use-attribute number (decimal string) to CQL index expression.
    #[serde(rename = "indexMap", default)]
    pub index_map: Option<HashMap<String, String>>,

    /// Optional CQL fragment `and`-joined to every translated query.
    #[serde(rename = "queryFilter", default)]
    pub query_filter: Option<String>,

    /// Positive chunk size for paged fetching; defaults to 10.
    #[serde(rename = "chunkSize", default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Mapping from CQL index name to suppressible modifier categories.
    #[serde(rename = "omitSortIndexModifiers", default)]
    pub omit_sort_index_modifiers: HashMap<String, HashSet<ModifierCategory>>,
}

fn default_chunk_size() -> u32 {
    10
}

impl Config {
    /// Load configuration from a JSON file on disk, applying environment substitution to
    /// every raw string value before parsing.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse configuration from a JSON string, applying environment substitution first.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let resolved = substitute_env(raw)?;
        let config: Config = serde_json::from_str(&resolved)?;
        Ok(config)
    }

    /// Effective chunk size, guaranteed positive even if the configured value was zero.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size.max(1)
    }

    /// The base URL to issue `search` calls against: the configured secondary query URL if
    /// present, otherwise the primary back-end base URL.
    pub fn search_base_url(&self) -> &str {
        self.query_url.as_deref().unwrap_or(&self.base_url)
    }
}

/// Resolve every `${NAME}` / `${NAME-DEFAULT}` placeholder in `text` against the process
/// environment. This is a raw-text pass performed before JSON structure is parsed, kept as
/// a phase distinct from `serde_json` parsing.
fn substitute_env(text: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start + 2..].find('}') else {
            out.push_str(rest);
            rest = "";
            break;
        };
        out.push_str(&rest[..start]);
        let inner = &rest[start + 2..start + 2 + end];
        let (name, default) = match inner.split_once('-') {
            Some((n, d)) => (n, Some(d)),
            None => (inner, None),
        };
        let resolved = match (std::env::var(name), default) {
            (Ok(v), _) => v,
            (Err(_), Some(d)) => d.to_string(),
            (Err(_), None) => {
                return Err(ConfigError::UnresolvedPlaceholder {
                    name: name.to_string(),
                });
            }
        };
        out.push_str(&resolved);
        rest = &rest[start + 2 + end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
