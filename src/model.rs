use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Raw files pulled out of a layer, keyed by filename.
pub type FileMap = HashMap<String, Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
}

/// A feature bound to one validated version string.
///
/// Serializes as a flat `{"name": ..., "version": ...}` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureVersion {
    #[serde(flatten)]
    pub feature: Feature,
    pub version: String,
}

impl FeatureVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            feature: Feature { name: name.into() },
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.feature.name
    }
}

/// Deduplicated collection of feature versions.
///
/// Entries are keyed on (name, version); the same name with a different
/// version is a distinct entry. Iteration is sorted by name, then version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    entries: BTreeSet<FeatureVersion>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the (name, version) pair was not already present.
    pub fn insert(&mut self, feature: FeatureVersion) -> bool {
        self.entries.insert(feature)
    }

    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.entries.contains(&FeatureVersion::new(name, version))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureVersion> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<FeatureVersion> {
        self.entries.into_iter().collect()
    }
}

impl FromIterator<FeatureVersion> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = FeatureVersion>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
