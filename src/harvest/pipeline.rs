//! Layer inventory pipeline.
//!
//! [`LayerPipeline`] runs the two stages a host needs to turn a layer blob
//! into a package inventory:
//! 1. **Extraction**: pull every file a registered lister needs out of the
//!    layer with the configured [`LayerExtractor`](crate::traits::LayerExtractor)
//! 2. **Listing**: run every registered lister over the extracted files,
//!    concurrently, through a [`ListerExecutor`]
//!
//! Both stages run on the blocking pool under a per-stage timeout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::executor::ListerExecutor;
use crate::harvest::formats::LegacyExtractor;
use crate::harvest::registry::Registry;
use crate::model::FeatureVersion;
use crate::traits::{ExtractionError, ListError};

const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONCURRENCY: usize = 4;

// ============================================================================
// Configuration
// ============================================================================

/// Serializable pipeline settings, for hosts that keep them in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the registered extractor that reads layers
    pub extractor: String,

    /// Timeout for each stage, in seconds
    pub stage_timeout_secs: u64,

    /// Maximum number of listers running at once
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extractor: LegacyExtractor::NAME.to_string(),
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Features found in one layer, grouped by the lister that found them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerInventory {
    /// Lister name -> features it listed (empty when its files were absent)
    pub features: BTreeMap<String, Vec<FeatureVersion>>,

    pub stats: LayerStats,
}

impl LayerInventory {
    /// All features, in lister name order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureVersion> {
        self.features.values().flatten()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerStats {
    pub files_extracted: usize,
    pub features_listed: usize,
    pub extraction_duration_ms: u64,
    pub listing_duration_ms: u64,
    pub total_duration_ms: u64,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Stage execution exceeded timeout
    #[error("Stage '{stage}' timed out after {timeout_secs}s")]
    StageTimeout { stage: String, timeout_secs: u64 },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Lister '{lister}' failed: {source}")]
    Listing { lister: String, source: ListError },

    #[error("Task join error: {0}")]
    Join(String),
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct LayerPipeline {
    registry: Arc<Registry>,
    extractor: String,
    stage_timeout: Duration,
    executor: ListerExecutor,
}

impl LayerPipeline {
    /// Creates a pipeline reading layers with the extractor named `extractor`.
    ///
    /// Default configuration:
    /// - Timeout: 5 minutes per stage
    /// - Concurrency: 4 listers at once
    pub fn new(registry: Arc<Registry>, extractor: impl Into<String>) -> Self {
        Self {
            registry,
            extractor: extractor.into(),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            executor: ListerExecutor::new(DEFAULT_CONCURRENCY),
        }
    }

    pub fn from_config(registry: Arc<Registry>, config: &PipelineConfig) -> Self {
        Self::new(registry, config.extractor.clone())
            .with_timeout(Duration::from_secs(config.stage_timeout_secs))
            .with_concurrency(config.concurrency)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.executor = ListerExecutor::new(limit);
        self
    }

    fn timed_out(&self, stage: &str) -> PipelineError {
        PipelineError::StageTimeout {
            stage: stage.to_string(),
            timeout_secs: self.stage_timeout.as_secs(),
        }
    }

    /// Extracts the files every registered lister needs from `layer` and
    /// lists the features they describe.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if:
    /// - A stage times out
    /// - The layer cannot be read or parsed, or the extractor is unknown
    /// - A lister fails
    #[instrument(skip(self, layer), fields(extractor = %self.extractor))]
    pub async fn execute(
        &self,
        mut layer: Box<dyn Read + Send>,
    ) -> Result<LayerInventory, PipelineError> {
        let start = Instant::now();
        let mut inventory = LayerInventory::default();

        // ====================================================================
        // Stage 1: Extraction
        // ====================================================================

        info!("Starting extraction stage");
        let extraction_start = Instant::now();

        let registry = Arc::clone(&self.registry);
        let format = self.extractor.clone();
        let files = timeout(
            self.stage_timeout,
            tokio::task::spawn_blocking(move || {
                let wanted = registry.required_filenames();
                registry.extract_files(&format, &mut *layer, &wanted)
            }),
        )
        .await
        .map_err(|_| self.timed_out("extraction"))?
        .map_err(|e| PipelineError::Join(e.to_string()))??;

        let files = Arc::new(files);
        inventory.stats.files_extracted = files.len();
        inventory.stats.extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = inventory.stats.extraction_duration_ms,
            files = inventory.stats.files_extracted,
            "Extraction completed"
        );

        // ====================================================================
        // Stage 2: Listing
        // ====================================================================

        info!("Starting listing stage");
        let listing_start = Instant::now();

        let mut tasks = JoinSet::new();
        for (name, lister) in self.registry.listers() {
            let name = name.to_string();
            let lister = Arc::clone(lister);
            let files = Arc::clone(&files);
            let executor = self.executor.clone();
            tasks.spawn(async move { (name, executor.execute(lister, files).await) });
        }

        let collected = timeout(self.stage_timeout, async {
            let mut collected = BTreeMap::new();
            while let Some(joined) = tasks.join_next().await {
                let (lister, result) = joined.map_err(|e| PipelineError::Join(e.to_string()))?;
                match result {
                    Ok(features) => {
                        collected.insert(lister, features);
                    }
                    Err(source) => return Err(PipelineError::Listing { lister, source }),
                }
            }
            Ok::<_, PipelineError>(collected)
        })
        .await
        .map_err(|_| self.timed_out("listing"))??;

        inventory.features = collected;
        inventory.stats.features_listed = inventory.features.values().map(Vec::len).sum();
        inventory.stats.listing_duration_ms = listing_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = inventory.stats.listing_duration_ms,
            features = inventory.stats.features_listed,
            "Listing completed"
        );

        inventory.stats.total_duration_ms = start.elapsed().as_millis() as u64;
        Ok(inventory)
    }
}

// ============================================================================
// Tests
// ============================================================================
