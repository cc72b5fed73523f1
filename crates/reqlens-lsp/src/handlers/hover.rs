//! Hover handler.

use crate::document::ServerState;
use reqlens_pypi::format_hover;
use tower_lsp_server::ls_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

/// Handles hover requests.
///
/// Resolves the declaration under the cursor, fetches its metadata through
/// the shared cache and renders a markdown card. Returns `None` off a
/// declaration or when the lookup fails.
pub async fn handle_hover(state: &ServerState, params: HoverParams) -> Option<Hover> {
    let uri = &params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    let document = state.get_document_clone(uri)?;
    let declaration = state.requirements.get_at_position(&document, position)?;

    let metadata = match state.metadata.fetch(declaration.name()).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!(package = declaration.name(), error = %e, "no hover");
            return None;
        }
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: format_hover(&metadata),
        }),
        range: Some(declaration.range),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{StaticRegistry, create_test_state, open_document};
    use reqlens_core::MetadataFetcher;
    use std::sync::Arc;
    use tower_lsp_server::ls_types::{
        Position, Range, TextDocumentIdentifier, TextDocumentPositionParams, Uri,
    };

    fn hover_params(uri: Uri, line: u32, character: u32) -> HoverParams {
        HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position: Position::new(line, character),
            },
            work_done_progress_params: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_handle_hover_missing_document() {
        let state = create_test_state(&[]);
        let uri = Uri::from_file_path("/test/requirements.txt").unwrap();

        let result = handle_hover(&state, hover_params(uri, 0, 0)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_handle_hover_requirements() {
        let state = create_test_state(&[("requests", "2.31.0")]);
        let uri = open_document(
            &state,
            "/test/requirements.txt",
            "pip-requirements",
            "requests==2.0.0\n",
        );

        let hover = handle_hover(&state, hover_params(uri, 0, 4)).await.unwrap();

        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(0, 0), Position::new(0, 15)))
        );
        match hover.contents {
            HoverContents::Markup(content) => {
                assert_eq!(content.kind, MarkupKind::Markdown);
                assert_eq!(
                    content.value,
                    "**requests – The requests package**\n\nLatest version: 2.31.0."
                );
            }
            _ => panic!("expected markdown hover"),
        }
    }

    #[tokio::test]
    async fn test_handle_hover_pyproject() {
        let state = create_test_state(&[("flask", "3.0.0")]);
        let uri = open_document(
            &state,
            "/test/pyproject.toml",
            "toml",
            "[project]\ndependencies = [\"flask>=2.0\"]\n",
        );

        let hover = handle_hover(&state, hover_params(uri, 1, 18)).await;
        assert!(hover.is_some());
    }

    #[tokio::test]
    async fn test_handle_hover_off_declaration() {
        let state = create_test_state(&[("requests", "2.31.0")]);
        let uri = open_document(
            &state,
            "/test/requirements.txt",
            "pip-requirements",
            "# comment\nrequests\n",
        );

        assert!(handle_hover(&state, hover_params(uri, 0, 2)).await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_hover_fetches_once() {
        let registry = StaticRegistry::new(&[("requests", "2.31.0")]);
        let state = ServerState::with_fetcher(Arc::clone(&registry) as Arc<dyn MetadataFetcher>);
        let uri = open_document(
            &state,
            "/test/requirements.txt",
            "pip-requirements",
            "requests==2.0.0\nrequests>=1.0\n",
        );

        assert!(handle_hover(&state, hover_params(uri.clone(), 0, 2)).await.is_some());
        assert!(handle_hover(&state, hover_params(uri.clone(), 0, 9)).await.is_some());
        assert!(handle_hover(&state, hover_params(uri, 1, 2)).await.is_some());
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_handle_hover_failed_fetch() {
        let state = create_test_state(&[]);
        let uri = open_document(
            &state,
            "/test/requirements.txt",
            "pip-requirements",
            "left-pad==1.0\n",
        );

        assert!(handle_hover(&state, hover_params(uri, 0, 0)).await.is_none());
    }
}
