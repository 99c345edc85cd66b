//! The operation dispatcher and XML record rendering: the seam this workspace exposes to an
//! external ASN.1/BER frontend, which calls into [`Dispatcher::init`], [`Dispatcher::search`],
//! [`Dispatcher::fetch`], and [`Dispatcher::delete`] and receives structured results or a
//! uniformly-shaped failure.

mod dispatch;
mod render;

pub use dispatch::{
    DispatchOutcome, Dispatcher, FetchOutcome, InitOutcome, SearchQuery, IMPLEMENTATION_ID,
    IMPLEMENTATION_NAME,
};
pub use render::render_instance;

pub use z2folio_session::Session;
