pub mod config;
pub mod document;
pub mod handlers;
pub mod scheduler;
pub mod server;

#[cfg(test)]
mod test_utils;

pub use config::ReqlensConfig;
pub use scheduler::{AnnotationHost, AnnotationScheduler, PassState};
pub use server::Backend;
