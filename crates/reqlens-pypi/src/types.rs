use tower_lsp_server::ls_types::Uri;

/// Manifest format of a document, decided from its language id and path.
///
/// # Examples
///
/// ```
/// use reqlens_pypi::DocumentKind;
/// use tower_lsp_server::ls_types::Uri;
///
/// let uri = Uri::from_file_path("/repo/pyproject.toml").unwrap();
/// assert_eq!(DocumentKind::detect("toml", &uri), DocumentKind::Pyproject);
///
/// let uri = Uri::from_file_path("/repo/Cargo.toml").unwrap();
/// assert_eq!(DocumentKind::detect("toml", &uri), DocumentKind::Unsupported);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Line-based pip requirements file.
    Requirements,
    /// Structural `pyproject.toml` build configuration.
    Pyproject,
    /// Anything else; extraction yields nothing.
    Unsupported,
}

impl DocumentKind {
    /// Classifies a document.
    ///
    /// Requirements files are recognized by the `pip-requirements` language
    /// id or by a `requirements*.txt` / `requirements*.in` file name. The
    /// structural format only applies to a path ending in `/pyproject.toml`
    /// (case-insensitive).
    pub fn detect(language_id: &str, uri: &Uri) -> Self {
        let path = uri.path().as_str().to_lowercase();

        if path.ends_with("/pyproject.toml") {
            return Self::Pyproject;
        }

        if matches!(language_id, "pip-requirements" | "requirements") {
            return Self::Requirements;
        }

        let file_name = path.rsplit('/').next().unwrap_or_default();
        if file_name.starts_with("requirements")
            && (file_name.ends_with(".txt") || file_name.ends_with(".in"))
        {
            return Self::Requirements;
        }

        Self::Unsupported
    }

    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(path: &str) -> Uri {
        Uri::from_file_path(path).unwrap()
    }

    #[test]
    fn test_detect_pyproject_case_insensitive() {
        assert_eq!(
            DocumentKind::detect("toml", &uri("/repo/PyProject.TOML")),
            DocumentKind::Pyproject
        );
    }

    #[test]
    fn test_detect_pyproject_requires_exact_file_name() {
        assert_eq!(
            DocumentKind::detect("toml", &uri("/repo/mypyproject.toml")),
            DocumentKind::Unsupported
        );
    }

    #[test]
    fn test_detect_requirements_by_language_id() {
        assert_eq!(
            DocumentKind::detect("pip-requirements", &uri("/repo/deps/base.txt")),
            DocumentKind::Requirements
        );
    }

    #[test]
    fn test_detect_requirements_by_file_name() {
        assert_eq!(
            DocumentKind::detect("plaintext", &uri("/repo/requirements-dev.txt")),
            DocumentKind::Requirements
        );
        assert_eq!(
            DocumentKind::detect("plaintext", &uri("/repo/requirements.in")),
            DocumentKind::Requirements
        );
    }

    #[test]
    fn test_detect_unsupported() {
        assert_eq!(
            DocumentKind::detect("json", &uri("/repo/package.json")),
            DocumentKind::Unsupported
        );
        assert!(!DocumentKind::Unsupported.is_supported());
        assert!(DocumentKind::Pyproject.is_supported());
    }
}
