//! The result set: a named container for one search, holding its CQL text, total count,
//! sparse indexed records, and chunk-fill policy. Records are fetched lazily, one chunk at a
//! time, rather than as an eager full-list fetch.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use z2folio_backend::BackendClient;
use z2folio_core::diagnostic::Diagnostic;

/// A single search's server-side state.
#[derive(Debug, Clone)]
pub struct ResultSet {
    name: String,
    cql: String,
    total: Option<u64>,
    records: HashMap<u64, JsonValue>,
}

impl ResultSet {
    /// Allocate a fresh result set with empty records and unknown total.
    pub fn new(name: impl Into<String>, cql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cql: cql.into(),
            total: None,
            records: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Set the total once; a repeated call with the same value is idempotent, a conflicting
    /// value is a fatal internal error surfaced as diagnostic 1.
    pub fn set_total(&mut self, n: u64) -> Result<(), Diagnostic> {
        match self.total {
            None => {
                self.total = Some(n);
                Ok(())
            }
            Some(existing) if existing == n => Ok(()),
            Some(existing) => Err(Diagnostic::conflicting_total(existing, n)),
        }
    }

    /// Store each `instances[i]` at ordinal `offset + i + 1`.
    pub fn insert(&mut self, offset: u64, instances: &[JsonValue]) {
        for (i, instance) in instances.iter().enumerate() {
            self.records.insert(offset + i as u64 + 1, instance.clone());
        }
    }

    /// Look up a 1-based ordinal.
    pub fn get(&self, ordinal: u64) -> Option<&JsonValue> {
        self.records.get(&ordinal)
    }

    /// Ensure the record at `ordinal` is materialized, fetching one further chunk from the
    /// back end if it is not yet cached. Issues at most one back-end search per call.
    pub async fn ensure_materialized(
        &mut self,
        ordinal: u64,
        chunk_size: u32,
        backend: &BackendClient,
        base_url: &str,
        tenant: &str,
        token: Option<&str>,
    ) -> Result<&JsonValue, Diagnostic> {
        if self.get(ordinal).is_none() {
            let chunk_size = chunk_size.max(1) as u64;
            let chunk_index = (ordinal - 1) / chunk_size;
            let offset = chunk_index * chunk_size;

            tracing::debug!(
                result_set = %self.name,
                ordinal,
                offset,
                chunk_size,
                "fetching chunk to materialize ordinal"
            );

            let result = backend
                .search(
                    base_url,
                    tenant,
                    token,
                    &self.cql,
                    offset as u32,
                    chunk_size as u32,
                )
                .await
                .map_err(|e| Diagnostic::backend_search_failed(e.to_string()))?;

            self.set_total(result.total_records)?;
            self.insert(offset, &result.instances);
        }

        self.get(ordinal).ok_or_else(|| Diagnostic::missing_record(ordinal))
    }
}
