//! The back-end client: authenticated JSON/HTTP calls against the bibliographic inventory
//! back end. Covers login (obtain a session token), search (offset/limit/CQL), and the
//! back-end error-decoding rule.

mod client;
mod error;

pub use client::{BackendClient, SearchResult};
pub use error::BackendError;
