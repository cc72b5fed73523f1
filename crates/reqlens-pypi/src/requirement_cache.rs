//! Per-document, per-revision memoized requirement extraction.

use crate::line_grammar::{extract_requirements_file, scan_dependency_blocks};
use crate::tree_grammar::extract_pyproject;
use crate::types::DocumentKind;
use lru::LruCache;
use parking_lot::Mutex;
use reqlens_core::{
    Declaration, DocumentRevisionKey, ExtractionResult, TextDocument, range_contains,
};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tower_lsp_server::ls_types::Position;

/// Default number of document revisions kept.
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(30).unwrap();

/// The interpreter's own pseudo-package, never annotated.
const RESERVED_NAME: &str = "python";

/// Memoizes [`ExtractionResult`]s by `(document, revision)`.
///
/// Entries are never invalidated explicitly: a content change bumps the
/// document revision, and old keys simply age out of the LRU.
///
/// # Examples
///
/// ```
/// use reqlens_core::TextDocument;
/// use reqlens_pypi::RequirementCache;
/// use tower_lsp_server::ls_types::Uri;
///
/// let cache = RequirementCache::new();
/// let uri = Uri::from_file_path("/repo/requirements.txt").unwrap();
/// let doc = TextDocument::new(uri, "pip-requirements", 1, "python>=3.9\nrequests==2.0.0\n");
///
/// let all = cache.get_all(&doc);
/// assert_eq!(all.len(), 1);
/// assert_eq!(all[0].name(), "requests");
/// ```
pub struct RequirementCache {
    entries: Mutex<LruCache<DocumentRevisionKey, ExtractionResult>>,
    fallback_line_scan: AtomicBool,
    extractions: AtomicUsize,
}

impl RequirementCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            fallback_line_scan: AtomicBool::new(false),
            extractions: AtomicUsize::new(0),
        }
    }

    /// Enables scanning `dependencies = [...]` blocks line by line when a
    /// `pyproject.toml` fails to parse as a whole.
    ///
    /// Cached results were computed under the old setting, so they are dropped.
    pub fn set_fallback_line_scan(&self, enabled: bool) {
        if self.fallback_line_scan.swap(enabled, Ordering::SeqCst) != enabled {
            self.clear();
        }
    }

    /// Returns every declaration of the document, in document order.
    ///
    /// Unsupported documents yield an empty result. The reserved `python`
    /// entry is filtered out.
    pub fn get_all(&self, document: &TextDocument) -> ExtractionResult {
        let key = document.revision_key();
        let mut entries = self.entries.lock();

        if let Some(cached) = entries.get(&key) {
            return ExtractionResult::clone(cached);
        }

        let result = self.extract(document);
        entries.put(key, ExtractionResult::clone(&result));
        result
    }

    /// Returns the first declaration whose range contains `position`.
    pub fn get_at_position(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Option<Declaration> {
        self.get_all(document)
            .iter()
            .find(|declaration| range_contains(declaration.range, position))
            .cloned()
    }

    /// Drops all cached entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of grammar runs so far (cache misses).
    pub fn extraction_count(&self) -> usize {
        self.extractions.load(Ordering::Relaxed)
    }

    fn extract(&self, document: &TextDocument) -> ExtractionResult {
        self.extractions.fetch_add(1, Ordering::Relaxed);

        let kind = DocumentKind::detect(&document.language_id, &document.uri);
        let declarations = match kind {
            DocumentKind::Requirements => extract_requirements_file(&document.text),
            DocumentKind::Pyproject => match extract_pyproject(&document.text) {
                Ok(declarations) => declarations,
                Err(e) => {
                    tracing::warn!(uri = ?document.uri, error = %e, "cannot parse manifest");
                    if self.fallback_line_scan.load(Ordering::SeqCst) {
                        scan_dependency_blocks(&document.text)
                    } else {
                        Vec::new()
                    }
                }
            },
            DocumentKind::Unsupported => Vec::new(),
        };

        let result: ExtractionResult = declarations
            .into_iter()
            .filter(|declaration| !declaration.name().eq_ignore_ascii_case(RESERVED_NAME))
            .collect();

        tracing::debug!(
            uri = ?document.uri,
            version = document.version,
            ?kind,
            count = result.len(),
            "extracted requirements"
        );

        result
    }
}

impl Default for RequirementCache {
    fn default() -> Self {
        Self::new()
    }
}
