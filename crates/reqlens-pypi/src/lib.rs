//! Python manifest support for reqlens.
//!
//! This crate turns Python dependency manifests into located declarations
//! and provides the PyPI client that looks up their latest releases.
//!
//! # Features
//!
//! - **Requirements files**: line grammar for `requirements*.txt` / `.in`
//! - **pyproject.toml**: structural grammar covering PEP 621, PEP 735,
//!   Poetry, PDM, uv, pixi and `build-system.requires`
//! - **Requirement cache**: memoized extraction per document revision
//! - **PyPI API client**: [`PypiRegistry`], a [`reqlens_core::MetadataFetcher`]
//! - **Formatting**: hover cards and inline annotation labels
//!
//! # Examples
//!
//! ```
//! use reqlens_pypi::tree_grammar::extract_pyproject;
//!
//! let content = r#"
//! [project]
//! dependencies = [
//!     "requests>=2.28.0,<3.0",
//!     "flask[async]>=3.0",
//! ]
//!
//! [tool.poetry.group.dev.dependencies]
//! pytest = "^7.0"
//! "#;
//!
//! let declarations = extract_pyproject(content).unwrap();
//! let names: Vec<_> = declarations.iter().map(|d| d.name()).collect();
//! assert_eq!(names, vec!["requests", "flask", "pytest"]);
//! assert_eq!(declarations[1].requirement.extras, vec!["async"]);
//! ```

pub mod error;
pub mod formatter;
pub mod line_grammar;
pub mod registry;
pub mod requirement_cache;
pub mod tree_grammar;
pub mod types;

pub use error::{PypiError, Result};
pub use formatter::{
    DEFAULT_ANNOTATION_COLUMN, OUTDATED_LABEL, UP_TO_DATE_LABEL, format_hover,
    latest_version_summary,
};
pub use registry::{PypiRegistry, normalize_package_name};
pub use requirement_cache::RequirementCache;
pub use types::DocumentKind;
