//! `z2folio check` command: validates a configuration file for internal consistency
//! (well-formed URLs and tenant, sane chunk size, coherent index map and modifier
//! suppression list) without contacting the back end.

use std::path::Path;

use anyhow::Result;
use z2folio_core::config::Config;

/// Severity level for a single check finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    pub category: String,
    pub message: String,
}

impl CheckFinding {
    fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: category.into(),
            message: message.into(),
        }
    }

    fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category: category.into(),
            message: message.into(),
        }
    }
}

/// Results from running all checks against a [`Config`].
#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn new() -> Self {
        Self {
            findings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn print_summary(&self) {
        let mut errors: Vec<_> = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .collect();
        let mut warnings: Vec<_> = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .collect();
        errors.sort_by(|a, b| a.category.cmp(&b.category));
        warnings.sort_by(|a, b| a.category.cmp(&b.category));

        if !errors.is_empty() {
            println!("\nErrors ({}):", errors.len());
            for finding in &errors {
                println!("  [{}] {}: {}", finding.severity, finding.category, finding.message);
            }
        }
        if !warnings.is_empty() {
            println!("\nWarnings ({}):", warnings.len());
            for finding in &warnings {
                println!("  [{}] {}: {}", finding.severity, finding.category, finding.message);
            }
        }

        println!();
        if errors.is_empty() && warnings.is_empty() {
            println!("All checks passed.");
        } else {
            println!("Summary: {} error(s), {} warning(s)", errors.len(), warnings.len());
        }
    }
}

/// Run all configuration checks quietly, returning the results without printing.
pub fn run_quiet(config_path: &Path) -> Result<CheckResults> {
    let mut results = CheckResults::new();

    let config = match Config::load_from_file(config_path) {
        Ok(config) => config,
        Err(err) => {
            results
                .findings
                .push(CheckFinding::error("config", format!("failed to load {}: {err}", config_path.display())));
            return Ok(results);
        }
    };

    if config.base_url.trim().is_empty() {
        results
            .findings
            .push(CheckFinding::error("config", "baseUrl must not be empty"));
    }
    if config.tenant.trim().is_empty() {
        results
            .findings
            .push(CheckFinding::error("config", "tenant must not be empty"));
    }
    if config.chunk_size == 0 {
        results.findings.push(CheckFinding::warning(
            "config",
            "chunkSize of 0 is not positive; the gateway will treat it as 1",
        ));
    }
    if config.credentials.username.is_none() || config.credentials.password.is_none() {
        results.findings.push(CheckFinding::warning(
            "credentials",
            "no default username/password configured; every init must supply its own credentials",
        ));
    }

    if let Some(index_map) = &config.index_map {
        for (use_attr, expression) in index_map {
            if use_attr.parse::<i64>().is_err() {
                results.findings.push(CheckFinding::error(
                    "indexMap",
                    format!("key {use_attr:?} is not a decimal use-attribute number"),
                ));
            }
            for component in expression.split(',') {
                if let Some((_, modifier)) = component.split_once('/') {
                    if modifier.split_once('=').is_none() {
                        results.findings.push(CheckFinding::error(
                            "indexMap",
                            format!("indexMap[{use_attr}] component {component:?} has a /modifier suffix with no =value"),
                        ));
                    }
                }
            }
        }
    } else {
        results.findings.push(CheckFinding::warning(
            "indexMap",
            "no indexMap configured; use attributes will be translated as raw numeric index names",
        ));
    }

    if let Some(filter) = &config.query_filter {
        if filter.trim().is_empty() {
            results.findings.push(CheckFinding::warning(
                "queryFilter",
                "queryFilter is configured but blank; it will be treated as absent",
            ));
        }
    }

    let known_indexes: std::collections::HashSet<&str> = config
        .index_map
        .iter()
        .flat_map(|m| m.values())
        .map(|v| v.split(',').next().unwrap_or(v).split('/').next().unwrap_or(v))
        .collect();
    for index_name in config.omit_sort_index_modifiers.keys() {
        if !known_indexes.contains(index_name.as_str()) {
            results.findings.push(CheckFinding::warning(
                "omitSortIndexModifiers",
                format!("index {index_name:?} is not produced by any indexMap entry"),
            ));
        }
    }

    Ok(results)
}

/// Run all configuration checks and print a human-readable summary.
pub fn run(config_path: &Path) -> Result<()> {
    let results = run_quiet(config_path)?;
    results.print_summary();
    if results.has_errors() {
        anyhow::bail!("configuration has errors");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_empty_base_url_and_tenant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"baseUrl":"","tenant":""}"#).unwrap();
        let results = run_quiet(&path).unwrap();
        assert!(results.has_errors());
    }

    #[test]
    fn clean_config_passes_without_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"baseUrl":"https://okapi.example.org","tenant":"diku","credentials":{"username":"a","password":"b"},"indexMap":{"4":"title"}}"#,
        )
        .unwrap();
        let results = run_quiet(&path).unwrap();
        assert!(!results.has_errors());
    }

    #[test]
    fn flags_malformed_index_map_modifier_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"baseUrl":"https://x","tenant":"diku","indexMap":{"4":"title/nomodifier"}}"#,
        )
        .unwrap();
        let results = run_quiet(&path).unwrap();
        assert!(results.has_errors());
    }
}
