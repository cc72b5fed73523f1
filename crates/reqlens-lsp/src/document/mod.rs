//! Document management module.
//!
//! - `state`: document and server state
//! - `lifecycle`: open/change/close event handling

mod lifecycle;
mod state;

pub use lifecycle::{handle_document_change, handle_document_close, handle_document_open};
pub use state::{DocumentState, ServerState};
