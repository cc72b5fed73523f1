use thiserror::Error;

/// Errors specific to Python manifest handling.
///
/// Only whole-document failures are errors. A line or array element that
/// does not look like a requirement is skipped, never reported.
#[derive(Error, Debug)]
pub enum PypiError {
    #[error("failed to parse pyproject.toml: {source}")]
    TomlParse {
        #[source]
        source: toml_edit::TomlError,
    },
}

/// Convenience type alias for `Result<T, PypiError>`.
pub type Result<T> = std::result::Result<T, PypiError>;
