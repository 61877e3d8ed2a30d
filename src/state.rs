use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use dashmap::DashMap;
use futures::future::AbortHandle;
use tracing::{debug, info};

use crate::config::{Config, StorageBackend};
use crate::history::{BlobStore, FileBlobStore, HistoryStore, MemoryBlobStore};
use crate::translate::{GoogleTranslateClient, TranslatorInterface};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translator: Arc<dyn TranslatorInterface>,
    pub history: Arc<HistoryStore>,
    pub pending_translations: Arc<PendingTranslations>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let translator = Arc::new(GoogleTranslateClient::from_config(&config.translation_config)?);

        let blobs: Arc<dyn BlobStore> = match config.history_config.storage_backend {
            StorageBackend::File => {
                let dir = config.system_config.data_path();
                info!("Persisting history under {:?}", dir);
                Arc::new(FileBlobStore::new(dir))
            }
            StorageBackend::Memory => {
                info!("Keeping history in memory only");
                Arc::new(MemoryBlobStore::new())
            }
        };
        let history = Arc::new(HistoryStore::open(blobs, &config.history_config).await);

        Ok(Self::with_parts(config, translator, history))
    }

    pub fn with_parts(
        config: Config,
        translator: Arc<dyn TranslatorInterface>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            config,
            translator,
            history,
            pending_translations: Arc::new(PendingTranslations::default()),
        }
    }
}

/// In-flight translation per client, so a dismissed screen can abort it
#[derive(Default)]
pub struct PendingTranslations {
    next_request_id: AtomicU64,
    tasks: DashMap<String, (u64, AbortHandle)>,
}

/// Unregisters its request when the handler finishes or is dropped
pub struct PendingGuard<'a> {
    pending: &'a PendingTranslations,
    client_id: String,
    request_id: u64,
}

impl PendingTranslations {
    /// Track `handle` for `client_id`, aborting the request it supersedes
    pub fn register(&self, client_id: &str, handle: AbortHandle) -> PendingGuard<'_> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self.tasks.insert(client_id.to_string(), (request_id, handle)) {
            debug!("Superseding pending translation for client {}", client_id);
            previous.abort();
        }
        PendingGuard {
            pending: self,
            client_id: client_id.to_string(),
            request_id,
        }
    }

    pub fn cancel(&self, client_id: &str) -> bool {
        match self.tasks.remove(client_id) {
            Some((_, (_, handle))) => {
                handle.abort();
                info!("Cancelled translation for client {}", client_id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .tasks
            .remove_if(&self.client_id, |_, (id, _)| *id == self.request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{abortable, Aborted};

    #[tokio::test]
    async fn test_cancel_aborts_registered_request() {
        let pending = PendingTranslations::default();
        let (task, handle) = abortable(futures::future::pending::<()>());
        let _guard = pending.register("client-1", handle);

        assert_eq!(pending.len(), 1);
        assert!(pending.cancel("client-1"));
        assert_eq!(task.await, Err(Aborted));
        assert!(!pending.cancel("client-1"));
    }

    #[tokio::test]
    async fn test_new_request_supersedes_previous() {
        let pending = PendingTranslations::default();
        let (first, first_handle) = abortable(futures::future::pending::<()>());
        let (_second, second_handle) = abortable(futures::future::pending::<()>());

        let first_guard = pending.register("client-1", first_handle);
        let _second_guard = pending.register("client-1", second_handle);
        assert_eq!(first.await, Err(Aborted));

        // The stale guard must not unregister the newer request.
        drop(first_guard);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_guard_unregisters_on_drop() {
        let pending = PendingTranslations::default();
        let (_task, handle) = abortable(futures::future::ready(()));
        {
            let _guard = pending.register("client-1", handle);
            assert!(!pending.is_empty());
        }
        assert!(pending.is_empty());
    }
}
