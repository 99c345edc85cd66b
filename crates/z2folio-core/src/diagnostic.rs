//! BIB-1 diagnostic taxonomy: one variant per protocol diagnostic code, each carrying the
//! addinfo the framework reports alongside it, plus an `Other` fallback that maps to code
//! 100 and an `Internal` variant for errors that must propagate upward and abort the
//! association rather than become a diagnostic.

use thiserror::Error;

/// A BIB-1 diagnostic, or an internal error that aborts the association.
#[derive(Debug, Error)]
pub enum Diagnostic {
    /// Code 1: permanent system error, also used for internal invariant violations surfaced
    /// to the client.
    #[error("permanent system error: {0}")]
    PermanentSystemError(String),

    /// Code 3: back-end search call failed; addinfo is the back-end message.
    #[error("unsupported search: {0}")]
    UnsupportedSearch(String),

    /// Code 13: present request out of range.
    #[error("present request out of range: ordinal {0}")]
    PresentOutOfRange(u64),

    /// Code 30: result set does not exist.
    #[error("result set does not exist: {0}")]
    ResultSetNotFound(String),

    /// Code 113: unsupported attribute type.
    #[error("unsupported attribute type: {0}")]
    UnsupportedAttributeType(i64),

    /// Code 114: unsupported use attribute.
    #[error("unsupported use attribute: {0}")]
    UnsupportedUseAttribute(String),

    /// Code 117: unsupported relation.
    #[error("unsupported relation: {0}")]
    UnsupportedRelation(i64),

    /// Code 119: unsupported position.
    #[error("unsupported position: {0}")]
    UnsupportedPosition(i64),

    /// Code 120: unsupported truncation.
    #[error("unsupported truncation: {0}")]
    UnsupportedTruncation(i64),

    /// Code 121: unsupported attribute set; addinfo is the offending OID.
    #[error("unsupported attribute set: {0}")]
    UnsupportedAttributeSet(String),

    /// Code 122: unsupported completeness.
    #[error("unsupported completeness: {0}")]
    UnsupportedCompleteness(i64),

    /// Code 128: illegal result-set name.
    #[error("illegal result-set name: {0}")]
    IllegalResultSetName(String),

    /// Code 1014: init/authentication failure (missing credentials or back-end rejection).
    #[error("authentication failure: {0}")]
    AuthFailure(String),

    /// Any other diagnostic, mapped to code 100.
    #[error("{0}")]
    Other(String),

    /// An unexpected internal error that must propagate upward and abort the association,
    /// rather than be reported as a diagnostic on the current operation.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Diagnostic {
    // ===== constructors, named after the condition rather than the variant =====

    pub fn missing_record(ordinal: u64) -> Self {
        Self::PermanentSystemError(format!("missing record at ordinal {ordinal}"))
    }

    pub fn conflicting_total(existing: u64, new: u64) -> Self {
        Self::PermanentSystemError(format!(
            "result set total already set to {existing}, conflicting value {new}"
        ))
    }

    pub fn backend_search_failed(message: impl Into<String>) -> Self {
        Self::UnsupportedSearch(message.into())
    }

    pub fn result_set_not_found(name: impl Into<String>) -> Self {
        Self::ResultSetNotFound(name.into())
    }

    pub fn illegal_result_set_name(name: impl Into<String>) -> Self {
        Self::IllegalResultSetName(name.into())
    }

    pub fn unsupported_attribute_set(oid: impl Into<String>) -> Self {
        Self::UnsupportedAttributeSet(oid.into())
    }

    pub fn unsupported_use_attribute(value: i64) -> Self {
        Self::UnsupportedUseAttribute(value.to_string())
    }

    pub fn missing_credentials() -> Self {
        Self::AuthFailure("missing username or password".to_string())
    }

    pub fn backend_login_failed(message: impl Into<String>) -> Self {
        Self::AuthFailure(message.into())
    }

    /// The numeric BIB-1 diagnostic code for this error, or `None` for [`Diagnostic::Internal`],
    /// which never surfaces as a diagnostic: it propagates and aborts the association instead.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::PermanentSystemError(_) => Some(1),
            Self::UnsupportedSearch(_) => Some(3),
            Self::PresentOutOfRange(_) => Some(13),
            Self::ResultSetNotFound(_) => Some(30),
            Self::UnsupportedAttributeType(_) => Some(113),
            Self::UnsupportedUseAttribute(_) => Some(114),
            Self::UnsupportedRelation(_) => Some(117),
            Self::UnsupportedPosition(_) => Some(119),
            Self::UnsupportedTruncation(_) => Some(120),
            Self::UnsupportedAttributeSet(_) => Some(121),
            Self::UnsupportedCompleteness(_) => Some(122),
            Self::IllegalResultSetName(_) => Some(128),
            Self::AuthFailure(_) => Some(1014),
            Self::Other(_) => Some(100),
            Self::Internal(_) => None,
        }
    }

    /// The addinfo string reported alongside the diagnostic code. Raw, not a formatted
    /// message: callers expect bare values like `"s1"` or `"999"`, not a prefixed sentence.
    pub fn addinfo(&self) -> String {
        match self {
            Self::PermanentSystemError(s) => s.clone(),
            Self::UnsupportedSearch(s) => s.clone(),
            Self::PresentOutOfRange(o) => o.to_string(),
            Self::ResultSetNotFound(s) => s.clone(),
            Self::UnsupportedAttributeType(t) => t.to_string(),
            Self::UnsupportedUseAttribute(s) => s.clone(),
            Self::UnsupportedRelation(t) => t.to_string(),
            Self::UnsupportedPosition(t) => t.to_string(),
            Self::UnsupportedTruncation(t) => t.to_string(),
            Self::UnsupportedAttributeSet(s) => s.clone(),
            Self::UnsupportedCompleteness(t) => t.to_string(),
            Self::IllegalResultSetName(s) => s.clone(),
            Self::AuthFailure(s) => s.clone(),
            Self::Other(s) => s.clone(),
            Self::Internal(e) => e.to_string(),
        }
    }
}
