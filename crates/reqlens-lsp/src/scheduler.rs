//! Debounced annotation passes.
//!
//! Every document moves through `Idle → Pending → Running → Idle`. A
//! [`schedule`](AnnotationScheduler::schedule) call while `Pending` restarts
//! the debounce timer; a call while `Running` starts a fresh timer without
//! touching the running pass. Two passes for one document may therefore
//! overlap, and whichever renders last wins.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use reqlens_core::version::classify;
use reqlens_core::{
    AnnotationRequest, AnnotationStatus, MetadataFetchCache, PackageMetadata, TextDocument,
};
use reqlens_pypi::{OUTDATED_LABEL, RequirementCache, UP_TO_DATE_LABEL};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::AbortHandle;
use tower_lsp_server::ls_types::Uri;

/// The editor side of an annotation pass.
#[async_trait]
pub trait AnnotationHost: Send + Sync {
    /// Returns the current snapshot of `uri` if an editor shows it.
    fn visible_document(&self, uri: &Uri) -> Option<TextDocument>;

    /// Removes every annotation rendered for `uri`.
    async fn clear_annotations(&self, uri: &Uri);

    /// Replaces the annotations of `uri` with `annotations`.
    async fn render_annotations(&self, uri: &Uri, annotations: Vec<AnnotationRequest>);
}

/// Timing and fan-out limits. Not user-configurable.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub debounce: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            max_concurrent_fetches: 10,
        }
    }
}

/// Label text attached to each annotation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLabels {
    pub outdated: String,
    pub up_to_date: String,
}

impl AnnotationLabels {
    fn label(&self, status: AnnotationStatus) -> &str {
        match status {
            AnnotationStatus::Outdated => &self.outdated,
            AnnotationStatus::UpToDate => &self.up_to_date,
        }
    }
}

impl Default for AnnotationLabels {
    fn default() -> Self {
        Self {
            outdated: OUTDATED_LABEL.to_string(),
            up_to_date: UP_TO_DATE_LABEL.to_string(),
        }
    }
}

/// Observable scheduling state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    /// A debounce timer is armed.
    Pending,
    /// At least one pass is fetching or rendering. A timer may be armed too.
    Running,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<AbortHandle>,
    running: usize,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.running == 0
    }
}

struct Inner {
    host: Arc<dyn AnnotationHost>,
    requirements: Arc<RequirementCache>,
    metadata: Arc<MetadataFetchCache>,
    labels: RwLock<AnnotationLabels>,
    config: SchedulerConfig,
    slots: DashMap<Uri, Slot>,
    generations: AtomicU64,
}

/// Coalesces document events into annotation passes.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AnnotationScheduler {
    inner: Arc<Inner>,
}

impl AnnotationScheduler {
    pub fn new(
        host: Arc<dyn AnnotationHost>,
        requirements: Arc<RequirementCache>,
        metadata: Arc<MetadataFetchCache>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                requirements,
                metadata,
                labels: RwLock::new(AnnotationLabels::default()),
                config,
                slots: DashMap::new(),
                generations: AtomicU64::new(1),
            }),
        }
    }

    /// Arms (or re-arms) the debounce timer for `uri`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, uri: Uri) {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let mut slot = self.inner.slots.entry(uri.clone()).or_default();

        if let Some(previous) = slot.pending.take() {
            previous.abort();
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            if !inner.begin_pass(&uri, generation) {
                return;
            }
            let _running = RunningGuard {
                inner: &inner,
                uri: &uri,
            };
            inner.run_pass(&uri).await;
        });

        slot.generation = generation;
        slot.pending = Some(task.abort_handle());
    }

    /// Disarms the timer of `uri`. A pass that is already running finishes.
    pub fn cancel(&self, uri: &Uri) {
        if let Some(mut slot) = self.inner.slots.get_mut(uri)
            && let Some(pending) = slot.pending.take()
        {
            pending.abort();
        }
        self.inner.slots.remove_if(uri, |_, slot| slot.is_idle());
    }

    /// Disarms every timer.
    pub fn cancel_all(&self) {
        let uris: Vec<Uri> = self.inner.slots.iter().map(|e| e.key().clone()).collect();
        for uri in uris {
            self.cancel(&uri);
        }
    }

    pub fn state(&self, uri: &Uri) -> PassState {
        match self.inner.slots.get(uri) {
            Some(slot) if slot.running > 0 => PassState::Running,
            Some(slot) if slot.pending.is_some() => PassState::Pending,
            _ => PassState::Idle,
        }
    }

    /// Replaces the labels used by subsequent passes.
    pub fn set_labels(&self, labels: AnnotationLabels) {
        *self.inner.labels.write() = labels;
    }

    pub fn labels(&self) -> AnnotationLabels {
        self.inner.labels.read().clone()
    }
}

impl Inner {
    /// Moves the slot from `Pending` to `Running`, unless a newer timer
    /// superseded this one.
    fn begin_pass(&self, uri: &Uri, generation: u64) -> bool {
        let Some(mut slot) = self.slots.get_mut(uri) else {
            return false;
        };
        if slot.generation != generation {
            return false;
        }
        slot.pending = None;
        slot.running += 1;
        true
    }

    fn finish_pass(&self, uri: &Uri) {
        if let Some(mut slot) = self.slots.get_mut(uri) {
            slot.running = slot.running.saturating_sub(1);
        }
        self.slots.remove_if(uri, |_, slot| slot.is_idle());
    }

    async fn run_pass(&self, uri: &Uri) {
        let Some(document) = self.host.visible_document(uri) else {
            tracing::debug!(?uri, "document not visible, skipping annotation pass");
            return;
        };

        self.host.clear_annotations(uri).await;

        let declarations = self.requirements.get_all(&document);

        let mut seen = HashSet::new();
        let names: Vec<String> = declarations
            .iter()
            .map(|declaration| declaration.name().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let resolved: HashMap<String, Arc<PackageMetadata>> = stream::iter(names)
            .map(|name| async move {
                let result = self.metadata.fetch(&name).await;
                (name, result)
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .filter_map(|(name, result)| async move {
                match result {
                    Ok(metadata) => Some((name, metadata)),
                    Err(e) => {
                        tracing::debug!(package = %name, error = %e, "omitting annotation");
                        None
                    }
                }
            })
            .collect()
            .await;

        let labels = self.labels.read().clone();
        let mut outdated = Vec::new();
        let mut up_to_date = Vec::new();

        for declaration in declarations.iter() {
            let Some(metadata) = resolved.get(declaration.name()) else {
                continue;
            };
            let Some(status) = classify(
                declaration.declared_version.as_deref(),
                &metadata.latest_version,
            ) else {
                continue;
            };

            let request = AnnotationRequest {
                range: declaration.range,
                status,
                label: labels.label(status).to_string(),
            };
            match status {
                AnnotationStatus::Outdated => outdated.push(request),
                AnnotationStatus::UpToDate => up_to_date.push(request),
            }
        }

        tracing::debug!(
            ?uri,
            outdated = outdated.len(),
            up_to_date = up_to_date.len(),
            "rendering annotations"
        );

        outdated.extend(up_to_date);
        self.host.render_annotations(uri, outdated).await;
    }
}

/// Leaves the `Running` state even if the pass panics or is aborted.
struct RunningGuard<'a> {
    inner: &'a Inner,
    uri: &'a Uri,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.inner.finish_pass(self.uri);
    }
}
