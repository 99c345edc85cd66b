//! Shared types for the z2folio gateway: the configuration snapshot, the RPN query tree,
//! and the BIB-1 diagnostic taxonomy.

pub mod config;
pub mod diagnostic;
pub mod rpn;

pub use config::{Config, ConfigError};
pub use diagnostic::Diagnostic;
pub use rpn::{AttributeElement, Rpn, Term};
