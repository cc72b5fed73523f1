use dashmap::DashMap;
use reqlens_core::{AnnotationRequest, MetadataFetchCache, MetadataFetcher, TextDocument};
use reqlens_pypi::{DocumentKind, PypiRegistry, RequirementCache};
use std::sync::Arc;
use tower_lsp_server::ls_types::Uri;

/// State for a single open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Latest full-text snapshot
    pub document: TextDocument,
    /// Manifest format, decided once at open
    pub kind: DocumentKind,
}

impl DocumentState {
    pub fn new(document: TextDocument) -> Self {
        let kind = DocumentKind::detect(&document.language_id, &document.uri);
        Self { document, kind }
    }
}

/// Global LSP server state.
///
/// Owns the open documents, the annotations last rendered for each of them
/// and both caches. Shared across handlers via `Arc`; the maps are
/// `DashMap`s so handlers never hold a lock across an `.await`.
///
/// # Examples
///
/// ```
/// use reqlens_lsp::document::ServerState;
///
/// let state = ServerState::new();
/// assert_eq!(state.document_count(), 0);
/// ```
pub struct ServerState {
    /// Open documents by URI
    pub documents: DashMap<Uri, DocumentState>,
    /// Annotations rendered by the last pass, by URI
    pub annotations: DashMap<Uri, Vec<AnnotationRequest>>,
    /// Extraction results by document revision
    pub requirements: Arc<RequirementCache>,
    /// Package metadata by name
    pub metadata: Arc<MetadataFetchCache>,
}

impl ServerState {
    /// Creates a server state backed by the public PyPI index.
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(PypiRegistry::new()))
    }

    /// Creates a server state backed by a custom metadata source.
    pub fn with_fetcher(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            documents: DashMap::new(),
            annotations: DashMap::new(),
            requirements: Arc::new(RequirementCache::new()),
            metadata: Arc::new(MetadataFetchCache::new(fetcher)),
        }
    }

    /// Returns a copy of the current snapshot of `uri`.
    ///
    /// The DashMap lock is released before returning.
    pub fn get_document_clone(&self, uri: &Uri) -> Option<TextDocument> {
        self.documents.get(uri).map(|doc| doc.document.clone())
    }

    /// Updates or inserts document state.
    pub fn update_document(&self, uri: Uri, state: DocumentState) {
        self.documents.insert(uri, state);
    }

    /// Removes a document together with its annotations.
    pub fn remove_document(&self, uri: &Uri) -> Option<(Uri, DocumentState)> {
        self.annotations.remove(uri);
        self.documents.remove(uri)
    }

    pub fn is_open(&self, uri: &Uri) -> bool {
        self.documents.contains_key(uri)
    }

    /// URIs of every open document.
    pub fn open_documents(&self) -> Vec<Uri> {
        self.documents.iter().map(|e| e.key().clone()).collect()
    }

    pub fn annotations_for(&self, uri: &Uri) -> Vec<AnnotationRequest> {
        self.annotations
            .get(uri)
            .map(|a| a.value().clone())
            .unwrap_or_default()
    }

    pub fn set_annotations(&self, uri: Uri, annotations: Vec<AnnotationRequest>) {
        self.annotations.insert(uri, annotations);
    }

    pub fn clear_annotations(&self, uri: &Uri) {
        self.annotations.remove(uri);
    }

    /// Drops both caches. Documents stay open.
    pub fn clear_caches(&self) {
        self.requirements.clear();
        self.metadata.clear();
    }

    /// Returns the number of open documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
