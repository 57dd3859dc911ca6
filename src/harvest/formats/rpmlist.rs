//! Lister for RPM package inventories exported as a JSON list.
//!
//! The layer carries a file named `rpmlist` holding an array of
//! `{"package": ..., "version": ...}` records, as produced by
//! `rpm -qa --queryformat`. Decoding is best-effort: a record that fails
//! to decode or carries an unusable version is logged and skipped, and
//! an unreadable top-level array yields an empty list unless the lister
//! is built with [`RpmListLister::strict`].

use serde::Deserialize;
use serde_json::value::RawValue;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::model::{FeatureSet, FeatureVersion, FileMap};
use crate::traits::{FeatureLister, ListError, VersionFormat};
use crate::versionfmt::RpmVersionFormat;

/// Filename the lister reads from the file map.
pub const REQUIRED_FILE: &str = "rpmlist";

/// Pseudo-package rpm uses to store imported GPG keys.
const GPG_PUBKEY: &str = "gpg-pubkey";

/// Written by rpm in place of a missing epoch.
const NO_EPOCH: &str = "(none):";

#[derive(Debug, Deserialize)]
struct RpmRecord {
    package: String,
    version: String,
}

/// [`FeatureLister`] for the `rpmlist` format.
pub struct RpmListLister {
    version_format: Arc<dyn VersionFormat>,
    strict: bool,
}

impl RpmListLister {
    pub const NAME: &'static str = "rpmlist";

    /// Creates a permissive lister validating versions with RPM syntax.
    pub fn new() -> Self {
        Self {
            version_format: Arc::new(RpmVersionFormat),
            strict: false,
        }
    }

    /// Replaces the version validator.
    pub fn with_version_format(mut self, version_format: Arc<dyn VersionFormat>) -> Self {
        self.version_format = version_format;
        self
    }

    /// When `true`, an unreadable top-level array is reported as
    /// [`ListError::MalformedDocument`] instead of an empty list.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn accept(&self, record: RpmRecord) -> Option<FeatureVersion> {
        if record.package == GPG_PUBKEY {
            return None;
        }

        let version = record.version.replace(NO_EPOCH, "");
        if let Err(e) = self.version_format.validate(&version) {
            warn!(
                error = %e,
                package = %record.package,
                version = %record.version,
                format = self.version_format.name(),
                "could not parse package version, skipping"
            );
            return None;
        }

        Some(FeatureVersion::new(record.package, version))
    }
}

impl Default for RpmListLister {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits the top-level array into independently decodable records.
///
/// Fails only when the array itself cannot be read. Anything after the
/// closing bracket is left unread.
fn records(
    content: &str,
) -> Result<impl Iterator<Item = Result<RpmRecord, serde_json::Error>> + '_, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(content);
    let elements: Vec<&RawValue> = Deserialize::deserialize(&mut de)?;
    Ok(elements
        .into_iter()
        .map(|raw| serde_json::from_str::<RpmRecord>(raw.get())))
}

impl FeatureLister for RpmListLister {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_filenames(&self) -> &[&'static str] {
        &[REQUIRED_FILE]
    }

    fn list_features(&self, files: &FileMap) -> Result<Vec<FeatureVersion>, ListError> {
        let Some(content) = files.get(REQUIRED_FILE) else {
            return Ok(Vec::new());
        };

        // Invalid UTF-8 becomes U+FFFD so it only taints the record holding it.
        let content = String::from_utf8_lossy(content);
        let records = match records(&content) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "couldn't read the package list");
                if self.strict {
                    return Err(ListError::MalformedDocument(e.to_string()));
                }
                return Ok(Vec::new());
            }
        };

        let mut packages = FeatureSet::new();
        let mut skipped = 0usize;
        for (index, record) in records.enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, index, "couldn't parse package");
                    skipped += 1;
                    continue;
                }
            };
            match self.accept(record) {
                Some(pkg) => {
                    packages.insert(pkg);
                }
                None => skipped += 1,
            }
        }

        debug!(packages = packages.len(), skipped, "listed rpm packages");
        Ok(packages.into_vec())
    }
}
