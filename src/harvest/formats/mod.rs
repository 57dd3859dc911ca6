//! Format implementations.
//!
//! - `rpmlist` - [`FeatureLister`](crate::traits::FeatureLister) for RPM
//!   inventories exported as a JSON list
//! - `legacy` - [`LayerExtractor`](crate::traits::LayerExtractor) for
//!   layers shipped as a single JSON document

pub mod legacy;
pub mod rpmlist;

pub use legacy::LegacyExtractor;
pub use rpmlist::RpmListLister;
