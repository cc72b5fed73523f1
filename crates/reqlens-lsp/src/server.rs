use crate::config::ReqlensConfig;
use crate::document::{
    ServerState, handle_document_change, handle_document_close, handle_document_open,
};
use crate::handlers::inlay_hints::InlayHintRenderer;
use crate::handlers::{code_lens, hover, inlay_hints};
use crate::scheduler::{AnnotationLabels, AnnotationScheduler, SchedulerConfig};
use reqlens_core::{MetadataFetcher, TextDocument};
use reqlens_pypi::PypiRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{
    CodeLens, CodeLensOptions, CodeLensParams, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    ExecuteCommandOptions, ExecuteCommandParams, Hover, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, InlayHint, InlayHintParams,
    MessageType, OneOf, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind,
};
use tower_lsp_server::{Client, LanguageServer, jsonrpc::Result};

/// LSP command identifiers.
mod commands {
    /// Command to flip `annotations.enabled`.
    pub const TOGGLE_ANNOTATIONS: &str = "reqlens.toggleAnnotations";
}

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
    config: Arc<RwLock<ReqlensConfig>>,
    scheduler: AnnotationScheduler,
}

impl Backend {
    /// Creates a backend that queries the public PyPI index.
    pub fn new(client: Client) -> Self {
        Self::with_fetcher(client, Arc::new(PypiRegistry::new()))
    }

    /// Creates a backend with a custom metadata source (mirror or test fake).
    pub fn with_fetcher(client: Client, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        let state = Arc::new(ServerState::with_fetcher(fetcher));
        let renderer = Arc::new(InlayHintRenderer::new(client.clone(), Arc::clone(&state)));
        let scheduler = AnnotationScheduler::new(
            renderer,
            Arc::clone(&state.requirements),
            Arc::clone(&state.metadata),
            SchedulerConfig::default(),
        );

        Self {
            client,
            state,
            config: Arc::new(RwLock::new(ReqlensConfig::default())),
            scheduler,
        }
    }

    async fn annotations_enabled(&self) -> bool {
        self.config.read().await.annotations.enabled
    }

    /// Installs a new configuration and re-annotates open documents.
    async fn apply_config(&self, config: ReqlensConfig) {
        tracing::debug!("applying configuration: {:?}", config);

        self.scheduler.set_labels(AnnotationLabels {
            outdated: config.annotations.outdated_text.clone(),
            up_to_date: config.annotations.up_to_date_text.clone(),
        });
        self.state
            .requirements
            .set_fallback_line_scan(config.parsing.fallback_line_scan);

        let enabled = config.annotations.enabled;
        *self.config.write().await = config;

        self.on_annotations_toggled(enabled).await;
    }

    async fn on_annotations_toggled(&self, enabled: bool) {
        if enabled {
            for uri in self.state.open_documents() {
                self.scheduler.schedule(uri);
            }
        } else {
            self.scheduler.cancel_all();
            self.state.annotations.clear();
            if let Err(e) = self.client.inlay_hint_refresh().await {
                tracing::debug!("inlay_hint_refresh not supported: {:?}", e);
            }
        }
    }

    async fn toggle_annotations(&self) -> bool {
        let enabled = {
            let mut config = self.config.write().await;
            config.annotations.enabled = !config.annotations.enabled;
            config.annotations.enabled
        };

        tracing::info!("annotations {}", if enabled { "enabled" } else { "disabled" });
        self.on_annotations_toggled(enabled).await;
        enabled
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            inlay_hint_provider: Some(OneOf::Left(true)),
            code_lens_provider: Some(CodeLensOptions {
                resolve_provider: Some(true),
            }),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: vec![commands::TOGGLE_ANNOTATIONS.into()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing reqlens-lsp server");

        if let Some(options) = params.initialization_options
            && let Some(config) = ReqlensConfig::from_settings(options)
        {
            self.apply_config(config).await;
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "reqlens-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("reqlens-lsp server initialized");
        self.client
            .log_message(MessageType::INFO, "reqlens-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down reqlens-lsp server");
        self.scheduler.cancel_all();
        self.state.clear_caches();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let document = TextDocument::new(item.uri, item.language_id, item.version, item.text);
        let annotate = self.annotations_enabled().await;

        handle_document_open(&self.state, &self.scheduler, document, annotate);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            let annotate = self.annotations_enabled().await;
            handle_document_change(
                &self.state,
                &self.scheduler,
                uri,
                version,
                change.text,
                annotate,
            );
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handle_document_close(&self.state, &self.scheduler, &params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Some(config) = ReqlensConfig::from_settings(params.settings) {
            self.apply_config(config).await;
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        Ok(hover::handle_hover(&self.state, params).await)
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        // Clone config before handling to release lock early
        let annotations_config = { self.config.read().await.annotations.clone() };

        Ok(Some(inlay_hints::handle_inlay_hints(
            &self.state,
            &params,
            &annotations_config,
        )))
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        let code_lens_config = { self.config.read().await.code_lens.clone() };

        Ok(Some(code_lens::handle_code_lens(
            &self.state,
            &params,
            &code_lens_config,
        )))
    }

    async fn code_lens_resolve(&self, params: CodeLens) -> Result<CodeLens> {
        Ok(code_lens::handle_code_lens_resolve(&self.state, params).await)
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        tracing::info!("execute_command: {:?}", params.command);

        if params.command == commands::TOGGLE_ANNOTATIONS {
            let enabled = self.toggle_annotations().await;
            return Ok(Some(serde_json::json!({ "enabled": enabled })));
        }

        Ok(None)
    }
}
