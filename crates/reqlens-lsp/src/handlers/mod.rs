//! LSP protocol handlers.
//!
//! - [`hover`]: package summary card for the declaration under the cursor
//! - [`inlay_hints`]: inline outdated / up-to-date annotations
//! - [`code_lens`]: latest version above each declaration
//!
//! Handlers read from [`ServerState`](crate::document::ServerState) and
//! degrade to an empty response on any failure; they never surface errors
//! to the client.

pub mod code_lens;
pub mod hover;
pub mod inlay_hints;
