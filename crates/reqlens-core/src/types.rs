//! Data model shared by the grammars, caches and the annotation pipeline.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tower_lsp_server::ls_types::{Position, Range, Uri};

/// A declared dependency identified by its project name.
///
/// Version constraints are tracked separately on [`Declaration`]. Two
/// requirements are equal when their names are equal; extras do not take part.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self
    }
}

/// One `(requirement, source range)` pair extracted from a manifest.
///
/// `range` is zero-based and half-open. For line manifests it spans the whole
/// line; for structural manifests it spans the key/value or array element
/// node. `declared_version` is the raw version text following the first
/// comparator (or the table value), if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub requirement: Requirement,
    pub range: Range,
    pub declared_version: Option<String>,
}

impl Declaration {
    pub fn new(requirement: Requirement, range: Range, declared_version: Option<String>) -> Self {
        Self {
            requirement,
            range,
            declared_version,
        }
    }

    pub fn name(&self) -> &str {
        &self.requirement.name
    }
}

/// Declarations for one document snapshot, in document order.
///
/// Shared by reference so cache hits hand out the same allocation.
pub type ExtractionResult = Arc<[Declaration]>;

/// Snapshot of an editor document handed to the pipeline by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub uri: Uri,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

impl TextDocument {
    pub fn new(
        uri: Uri,
        language_id: impl Into<String>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            version,
            text: text.into(),
        }
    }

    /// Memoization key for this snapshot.
    pub fn revision_key(&self) -> DocumentRevisionKey {
        DocumentRevisionKey {
            uri: self.uri.clone(),
            version: self.version,
        }
    }

    /// Returns the text of a zero-based line without its terminator.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(line as usize)
    }

    /// Width of a line in UTF-16 code units, as LSP positions count them.
    pub fn line_width(&self, line: u32) -> u32 {
        self.line(line).map_or(0, utf16_len)
    }
}

/// `(document identity, revision counter)`.
///
/// Any content change bumps the revision, so stale entries simply stop being
/// looked up and age out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRevisionKey {
    pub uri: Uri,
    pub version: i32,
}

/// Published metadata for one package, as returned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub latest_version: String,
    pub summary: Option<String>,
    pub homepage: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub license: Option<String>,
    pub package_url: Option<String>,
    pub release_url: Option<String>,
    /// Upload timestamp of the first file of the latest release.
    pub release_date: Option<String>,
}

/// Outcome of comparing a declared version against the latest release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationStatus {
    Outdated,
    UpToDate,
}

/// A single classified range ready for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub range: Range,
    pub status: AnnotationStatus,
    pub label: String,
}

/// Checks whether `position` falls inside `range` (inclusive start, exclusive end).
pub fn range_contains(range: Range, position: Position) -> bool {
    !(range.end.line < position.line
        || (range.end.line == position.line && range.end.character <= position.character)
        || position.line < range.start.line
        || (position.line == range.start.line && position.character < range.start.character))
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}
