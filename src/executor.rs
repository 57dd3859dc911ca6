use crate::model::{FeatureVersion, FileMap};
use crate::traits::{FeatureLister, ListError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument};

/// Runs listers on the blocking pool, at most `concurrency_limit` at a time.
///
/// Listers only read the file map, so any number of them may share one.
#[derive(Clone)]
pub struct ListerExecutor {
    semaphore: Arc<Semaphore>,
}

impl ListerExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
        }
    }

    #[instrument(skip(self, lister, files), fields(lister = lister.name()))]
    pub async fn execute(
        &self,
        lister: Arc<dyn FeatureLister>,
        files: Arc<FileMap>,
    ) -> Result<Vec<FeatureVersion>, ListError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ListError::Unknown(format!("Semaphore error: {}", e)))?;

        info!("Starting feature listing");

        let task_lister = Arc::clone(&lister);
        let result = tokio::task::spawn_blocking(move || task_lister.list_features(&files))
            .await
            .map_err(|e| ListError::Unknown(format!("Task join error: {}", e)))?;

        info!(
            features = result.as_ref().map(Vec::len).unwrap_or(0),
            "Finished feature listing"
        );
        result
    }
}
