//! Test utilities for handler tests.

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::document::{DocumentState, ServerState};
    use async_trait::async_trait;
    use reqlens_core::error::{FetchError, Result};
    use reqlens_core::{MetadataFetcher, PackageMetadata, TextDocument};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower_lsp_server::ls_types::Uri;

    /// In-memory registry: known names resolve, everything else is not found.
    pub(crate) struct StaticRegistry {
        latest: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl StaticRegistry {
        pub(crate) fn new(latest: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                latest: latest
                    .iter()
                    .map(|(name, version)| ((*name).to_string(), (*version).to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataFetcher for StaticRegistry {
        async fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.latest
                .get(name)
                .map(|version| PackageMetadata {
                    name: name.to_string(),
                    latest_version: version.clone(),
                    summary: Some(format!("The {name} package")),
                    ..Default::default()
                })
                .ok_or_else(|| FetchError::NotFound {
                    package: name.to_string(),
                })
        }
    }

    /// Creates a server state backed by [`StaticRegistry`].
    pub(crate) fn create_test_state(latest: &[(&str, &str)]) -> Arc<ServerState> {
        Arc::new(ServerState::with_fetcher(StaticRegistry::new(latest)))
    }

    /// Opens a document in `state` and returns its URI.
    pub(crate) fn open_document(
        state: &ServerState,
        path: &str,
        language_id: &str,
        text: &str,
    ) -> Uri {
        let uri = Uri::from_file_path(path).unwrap();
        let document = TextDocument::new(uri.clone(), language_id, 1, text);
        state.update_document(uri.clone(), DocumentState::new(document));
        uri
    }
}
