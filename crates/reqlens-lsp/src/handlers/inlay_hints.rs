//! Inlay hints: the annotation surface.
//!
//! Annotation passes store their results in [`ServerState`] and ask the
//! client to refresh; the client then pulls hints through
//! [`handle_inlay_hints`].

use crate::config::AnnotationsConfig;
use crate::document::ServerState;
use crate::scheduler::AnnotationHost;
use async_trait::async_trait;
use reqlens_core::{AnnotationRequest, TextDocument};
use reqlens_pypi::formatter::padded_label;
use std::sync::Arc;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::{
    InlayHint, InlayHintLabel, InlayHintParams, InlayHintTooltip, Position, Uri,
};

/// Renders annotation passes as inlay hints of an LSP client.
pub struct InlayHintRenderer {
    client: Client,
    state: Arc<ServerState>,
}

impl InlayHintRenderer {
    pub fn new(client: Client, state: Arc<ServerState>) -> Self {
        Self { client, state }
    }

    async fn refresh(&self) {
        if let Err(e) = self.client.inlay_hint_refresh().await {
            tracing::debug!("inlay_hint_refresh not supported: {:?}", e);
        }
    }
}

#[async_trait]
impl AnnotationHost for InlayHintRenderer {
    fn visible_document(&self, uri: &Uri) -> Option<TextDocument> {
        self.state.get_document_clone(uri)
    }

    async fn clear_annotations(&self, uri: &Uri) {
        if self.state.annotations.remove(uri).is_some() {
            self.refresh().await;
        }
    }

    async fn render_annotations(&self, uri: &Uri, annotations: Vec<AnnotationRequest>) {
        // The document may have been closed while the pass was fetching.
        if !self.state.is_open(uri) {
            return;
        }
        self.state.set_annotations(uri.clone(), annotations);
        self.refresh().await;
    }
}

/// Handles inlay hint requests.
///
/// Returns one hint per stored annotation whose line falls in the requested
/// range, placed at the end of that line. Returns an empty vec when
/// annotations are disabled or the document is unknown.
pub fn handle_inlay_hints(
    state: &ServerState,
    params: &InlayHintParams,
    config: &AnnotationsConfig,
) -> Vec<InlayHint> {
    if !config.enabled {
        return vec![];
    }

    let uri = &params.text_document.uri;
    let Some(document) = state.get_document_clone(uri) else {
        return vec![];
    };

    let requested = params.range.start.line..=params.range.end.line;

    state
        .annotations_for(uri)
        .into_iter()
        .filter(|annotation| requested.contains(&annotation.range.start.line))
        .map(|annotation| annotation_hint(&document, annotation, config.column))
        .collect()
}

fn annotation_hint(
    document: &TextDocument,
    annotation: AnnotationRequest,
    column: u32,
) -> InlayHint {
    let line = annotation.range.start.line;
    let width = document.line_width(line);

    InlayHint {
        position: Position::new(line, width),
        label: InlayHintLabel::String(padded_label(&annotation.label, width, column)),
        kind: None,
        text_edits: None,
        tooltip: Some(InlayHintTooltip::String(annotation.label)),
        padding_left: None,
        padding_right: None,
        data: None,
    }
}
