//! Harvest module - layer extraction and feature listing.
//!
//! This module provides the concrete side of the layer harvester:
//! - **Formats**: [`RpmListLister`] and [`LegacyExtractor`]
//! - **Registry**: explicit name -> implementation lookup via [`Registry`]
//! - **Pipeline**: async extract-then-list executor via [`LayerPipeline`]

pub mod formats;
pub mod pipeline;
pub mod registry;

// Re-export commonly used types
pub use formats::{LegacyExtractor, RpmListLister};
pub use pipeline::{LayerInventory, LayerPipeline, LayerStats, PipelineConfig, PipelineError};
pub use registry::Registry;
