//! Core abstractions for reqlens.
//!
//! This crate holds the manifest-independent parts of the annotation
//! pipeline:
//!
//! - **Data model**: [`Requirement`], [`Declaration`], [`ExtractionResult`],
//!   [`PackageMetadata`], [`AnnotationRequest`] and the document snapshot
//!   types the host hands in
//! - **Version comparison**: coercion to `major.minor.patch` and
//!   outdated / up-to-date classification ([`version`])
//! - **Metadata cache**: deduplicated, memoized package lookups on top of a
//!   pluggable [`MetadataFetcher`]
//! - **Error types**: the fetch failure taxonomy ([`FetchError`])
//!
//! # Examples
//!
//! ```
//! use reqlens_core::AnnotationStatus;
//! use reqlens_core::version::classify;
//!
//! assert_eq!(classify(Some("==2.0.0"), "2.31.0"), Some(AnnotationStatus::Outdated));
//! assert_eq!(classify(Some("2.0.0"), "1.9.9"), Some(AnnotationStatus::UpToDate));
//! ```

pub mod cache;
pub mod error;
pub mod types;
pub mod version;

pub use cache::{MetadataFetchCache, MetadataFetcher};
pub use error::{FetchError, Result};
pub use types::{
    AnnotationRequest, AnnotationStatus, Declaration, DocumentRevisionKey, ExtractionResult,
    PackageMetadata, Requirement, TextDocument, range_contains, utf16_len,
};
