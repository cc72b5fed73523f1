use crate::error::{FetchError, Result};
use crate::types::PackageMetadata;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;

/// Source of published package metadata.
///
/// Implementors perform the actual network lookup; [`MetadataFetchCache`]
/// takes care of memoization and request deduplication on top of it.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use reqlens_core::{MetadataFetcher, PackageMetadata};
/// use reqlens_core::error::Result;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl MetadataFetcher for Fixed {
///     async fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata> {
///         Ok(PackageMetadata {
///             name: name.to_string(),
///             latest_version: "1.0.0".into(),
///             ..Default::default()
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches metadata for one package.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FetchError`] when the registry cannot provide
    /// metadata for `name`.
    async fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata>;

    /// Canonical cache key for a package name.
    ///
    /// Registries with case- or separator-insensitive names should override
    /// this so spelling variants share one cache entry.
    fn cache_key(&self, name: &str) -> String {
        name.to_string()
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<PackageMetadata>>>>;

/// Process-wide memoized metadata lookups.
///
/// At most one fetch per package name is outstanding at any time: the first
/// caller installs a shared in-flight future under the name, and concurrent
/// callers for the same name await that same future. Successful results stay
/// cached until [`clear`](Self::clear); failures evict the entry so the next
/// call retries.
///
/// Metadata is not tied to any document revision. Registry data changes far
/// less often than documents, so a stale entry is acceptable.
///
/// # Examples
///
/// ```no_run
/// # use reqlens_core::{MetadataFetchCache, MetadataFetcher};
/// # use std::sync::Arc;
/// # async fn example(fetcher: Arc<dyn MetadataFetcher>) {
/// let cache = MetadataFetchCache::new(fetcher);
///
/// let first = cache.fetch("requests").await.unwrap();
/// let second = cache.fetch("requests").await.unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// # }
/// ```
pub struct MetadataFetchCache {
    fetcher: Arc<dyn MetadataFetcher>,
    entries: DashMap<String, SharedFetch>,
}

impl MetadataFetchCache {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            fetcher,
            entries: DashMap::new(),
        }
    }

    /// Resolves metadata for `name`, joining an in-flight fetch if one exists.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's [`FetchError`]. Every caller that joined the
    /// failed fetch receives the same error.
    pub async fn fetch(&self, name: &str) -> Result<Arc<PackageMetadata>> {
        let key = self.fetcher.cache_key(name);

        // The entry guard makes get-or-create atomic per shard.
        let shared = match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let fetcher = Arc::clone(&self.fetcher);
                let package = key.clone();
                let fetch = async move { fetcher.fetch_metadata(&package).await.map(Arc::new) }
                    .boxed()
                    .shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        let result = shared.clone().await;

        if let Err(error) = &result {
            self.evict_failed(&key, &shared, error);
        }

        result
    }

    /// Removes a failed fetch, unless a newer fetch already replaced it.
    ///
    /// Only the caller that actually evicts logs, so one failure produces
    /// one log line regardless of how many callers shared it.
    fn evict_failed(&self, key: &str, failed: &SharedFetch, error: &FetchError) {
        let evicted = self
            .entries
            .remove_if(key, |_, current| current.ptr_eq(failed))
            .is_some();

        if evicted {
            tracing::warn!(package = %key, error = %error, "package metadata fetch failed");
        }
    }

    /// Returns `true` if `name` has a cached or in-flight entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&self.fetcher.cache_key(name))
    }

    /// Drops every cached and in-flight entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
