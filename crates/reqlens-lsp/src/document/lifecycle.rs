//! Document open/change/close handling.
//!
//! The server keeps the latest full-text snapshot of every supported
//! manifest and arms an annotation pass whenever that snapshot changes.

use super::state::{DocumentState, ServerState};
use crate::scheduler::AnnotationScheduler;
use reqlens_core::TextDocument;
use tower_lsp_server::ls_types::Uri;

/// Stores a newly opened document and schedules its first pass.
///
/// Unsupported documents are not tracked. Returns whether the document was
/// stored.
pub fn handle_document_open(
    state: &ServerState,
    scheduler: &AnnotationScheduler,
    document: TextDocument,
    annotate: bool,
) -> bool {
    let doc_state = DocumentState::new(document);
    if !doc_state.kind.is_supported() {
        tracing::debug!("unsupported file type: {:?}", doc_state.document.uri);
        return false;
    }

    let uri = doc_state.document.uri.clone();
    tracing::info!(
        "document opened: {:?} ({:?}, version {})",
        uri,
        doc_state.kind,
        doc_state.document.version
    );

    state.update_document(uri.clone(), doc_state);
    if annotate {
        scheduler.schedule(uri);
    }
    true
}

/// Replaces the snapshot of an open document and reschedules its pass.
///
/// Changes to documents that were never opened (or are unsupported) are
/// ignored. Returns whether the snapshot was updated.
pub fn handle_document_change(
    state: &ServerState,
    scheduler: &AnnotationScheduler,
    uri: Uri,
    version: i32,
    text: String,
    annotate: bool,
) -> bool {
    let Some(mut entry) = state.documents.get_mut(&uri) else {
        tracing::debug!("change for untracked document: {:?}", uri);
        return false;
    };

    let language_id = std::mem::take(&mut entry.document.language_id);
    entry.document = TextDocument::new(uri.clone(), language_id, version, text);
    drop(entry);

    if annotate {
        scheduler.schedule(uri);
    }
    true
}

/// Forgets a closed document: snapshot, annotations and any armed timer.
pub fn handle_document_close(state: &ServerState, scheduler: &AnnotationScheduler, uri: &Uri) {
    tracing::info!("document closed: {:?}", uri);
    scheduler.cancel(uri);
    state.remove_document(uri);
}
