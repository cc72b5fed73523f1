use reqlens_lsp::server::Backend;
use reqlens_pypi::PypiRegistry;
use std::sync::Arc;
use tower_lsp_server::{LspService, Server};
use tracing_subscriber::EnvFilter;

/// Overrides the PyPI base URL (mirrors, integration tests).
const PYPI_URL_ENV: &str = "REQLENS_PYPI_URL";

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = match std::env::var(PYPI_URL_ENV) {
        Ok(base_url) if !base_url.is_empty() => {
            tracing::info!("using package index at {}", base_url);
            let registry = Arc::new(PypiRegistry::with_base_url(base_url));
            LspService::new(move |client| Backend::with_fetcher(client, registry.clone()))
        }
        _ => LspService::new(Backend::new),
    };

    Server::new(stdin, stdout, socket).serve(service).await;
}
