//! Version-format validators.
//!
//! Listers never interpret versions themselves; they hand the normalized
//! string to a [`VersionFormat`](crate::traits::VersionFormat) for the
//! ecosystem they target and drop whatever it rejects.

pub mod rpm;

pub use rpm::RpmVersionFormat;

/// Sentinel accepted by every format as "lower than any version".
pub const MIN_VERSION: &str = "#MINV#";

/// Sentinel accepted by every format as "higher than any version".
pub const MAX_VERSION: &str = "#MAXV#";
