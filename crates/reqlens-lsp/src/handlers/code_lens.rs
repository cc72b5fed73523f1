//! Latest-version code lenses.
//!
//! Lenses are listed without titles; the title is fetched on
//! `codeLens/resolve` so only visible lenses cost a registry lookup.

use crate::config::CodeLensConfig;
use crate::document::ServerState;
use reqlens_pypi::latest_version_summary;
use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::{CodeLens, CodeLensParams, Command};

#[derive(Debug, Serialize, Deserialize)]
struct LensData {
    package: String,
}

/// Lists one unresolved lens per declaration.
pub fn handle_code_lens(
    state: &ServerState,
    params: &CodeLensParams,
    config: &CodeLensConfig,
) -> Vec<CodeLens> {
    if !config.enabled {
        return vec![];
    }

    let Some(document) = state.get_document_clone(&params.text_document.uri) else {
        return vec![];
    };

    state
        .requirements
        .get_all(&document)
        .iter()
        .map(|declaration| CodeLens {
            range: declaration.range,
            command: None,
            data: serde_json::to_value(LensData {
                package: declaration.name().to_string(),
            })
            .ok(),
        })
        .collect()
}

/// Fills in the lens title: the latest version, or why it is unknown.
pub async fn handle_code_lens_resolve(state: &ServerState, mut lens: CodeLens) -> CodeLens {
    let Some(data) = lens
        .data
        .clone()
        .and_then(|data| serde_json::from_value::<LensData>(data).ok())
    else {
        tracing::debug!("code lens without package data: {:?}", lens.range);
        return lens;
    };

    let title = match state.metadata.fetch(&data.package).await {
        Ok(metadata) => latest_version_summary(&metadata),
        Err(e) => e.to_string(),
    };

    lens.command = Some(Command {
        title,
        command: String::new(),
        arguments: None,
    });
    lens
}
