use thiserror::Error;

/// Failure classification for a package metadata lookup.
///
/// The error is `Clone` because a single in-flight fetch is shared by every
/// caller that asked for the same package while it was running, and each of
/// them receives its own copy of the outcome.
///
/// The `Display` output is the message surfaced to users (code lens titles)
/// and written to the log.
///
/// # Examples
///
/// ```
/// use reqlens_core::error::FetchError;
///
/// let error = FetchError::NotFound { package: "left-pad".into() };
/// assert_eq!(error.to_string(), "package `left-pad` not found in registry");
/// assert_eq!(error.package(), "left-pad");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The registry answered with "no such package".
    #[error("package `{package}` not found in registry")]
    NotFound { package: String },

    /// The registry answered with any other non-success status.
    #[error("unexpected {status} response from registry: {body}")]
    Upstream {
        package: String,
        status: u16,
        body: String,
    },

    /// The request never completed (DNS, connect, timeout).
    #[error("cannot connect to registry: {message}")]
    Network { package: String, message: String },

    /// The registry answered 2xx with a body that is not package metadata.
    #[error("invalid registry response for `{package}`: {message}")]
    InvalidResponse { package: String, message: String },
}

impl FetchError {
    /// Name of the package whose lookup failed.
    pub fn package(&self) -> &str {
        match self {
            Self::NotFound { package }
            | Self::Upstream { package, .. }
            | Self::Network { package, .. }
            | Self::InvalidResponse { package, .. } => package,
        }
    }
}

/// Convenience type alias for `Result<T, FetchError>`.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = FetchError::NotFound {
            package: "nope".into(),
        };
        assert_eq!(error.to_string(), "package `nope` not found in registry");
    }

    #[test]
    fn test_upstream_display_includes_status_and_body() {
        let error = FetchError::Upstream {
            package: "requests".into(),
            status: 503,
            body: "service unavailable".into(),
        };
        assert_eq!(
            error.to_string(),
            "unexpected 503 response from registry: service unavailable"
        );
    }

    #[test]
    fn test_network_display() {
        let error = FetchError::Network {
            package: "numpy".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            error.to_string(),
            "cannot connect to registry: connection refused"
        );
    }

    #[test]
    fn test_package_accessor() {
        let errors = [
            FetchError::NotFound {
                package: "a".into(),
            },
            FetchError::Upstream {
                package: "a".into(),
                status: 500,
                body: String::new(),
            },
            FetchError::Network {
                package: "a".into(),
                message: String::new(),
            },
            FetchError::InvalidResponse {
                package: "a".into(),
                message: String::new(),
            },
        ];
        assert!(errors.iter().all(|e| e.package() == "a"));
    }
}
