//! `z2folio explain` command: translates one RPN query, given as JSON on the command line
//! (or `@path` to a file containing JSON), against a configuration file and prints the
//! resulting CQL or diagnostic. A read-only diagnostic companion to the core translator;
//! it has no session, so `RSID` references against a prior result set always fail with
//! diagnostic 128 since no result set can exist outside a live association.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use z2folio_core::config::Config;
use z2folio_core::rpn::Rpn;
use z2folio_query::translate;

/// Parses `rpn_arg` as literal JSON, or (if it starts with `@`) reads JSON from the named
/// file, and deserializes it into an [`Rpn`] tree.
fn parse_rpn(rpn_arg: &str) -> Result<Rpn> {
    let raw = match rpn_arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read RPN JSON from {path}"))?,
        None => rpn_arg.to_string(),
    };
    serde_json::from_str(&raw).context("failed to parse RPN JSON")
}

/// Runs the `explain` command: load config, parse the RPN tree, translate it, and print the
/// result. Returns the rendered CQL string (or the formatted diagnostic) for testability.
pub fn run(
    config_path: &Path,
    rpn_arg: &str,
    default_attribute_set: Option<&str>,
) -> Result<String> {
    let config = Config::load_from_file(config_path)
        .with_context(|| format!("failed to load configuration {}", config_path.display()))?;
    let rpn = parse_rpn(rpn_arg)?;

    // No live session exists for an offline `explain`; RSID references resolve against an
    // empty result-set namespace and therefore always fail with diagnostic 128.
    let result_sets: HashSet<String> = HashSet::new();

    let rendered = match translate(&rpn, default_attribute_set, &config, &result_sets) {
        Ok(cql) => cql,
        Err(diagnostic) => format!(
            "diagnostic {}: {}",
            diagnostic.code().unwrap_or(100),
            diagnostic.addinfo()
        ),
    };
    println!("{rendered}");
    Ok(rendered)
}
