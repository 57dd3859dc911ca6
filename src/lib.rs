pub mod executor;
pub mod harvest;
pub mod logging;
pub mod model;
pub mod traits;
pub mod versionfmt;

// Re-export common types for convenience
pub use executor::*;
pub use harvest::{LayerPipeline, LegacyExtractor, Registry, RpmListLister};
pub use model::*;
pub use traits::*;
