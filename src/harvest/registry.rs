//! Explicit registry of listers and extractors.
//!
//! Hosts build one [`Registry`] at startup, register the formats they
//! support, then share it behind an `Arc`. Nothing registers itself.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};

use crate::harvest::formats::{LegacyExtractor, RpmListLister};
use crate::model::{FeatureVersion, FileMap};
use crate::traits::{ExtractionError, FeatureLister, LayerExtractor, ListError};

/// Format name -> implementation lookup for listers and extractors.
#[derive(Default, Clone)]
pub struct Registry {
    listers: BTreeMap<String, Arc<dyn FeatureLister>>,
    extractors: BTreeMap<String, Arc<dyn LayerExtractor>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every format shipped with this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_lister(Arc::new(RpmListLister::new()));
        registry.register_extractor(Arc::new(LegacyExtractor));
        registry
    }

    /// Registers `lister` under its own name, replacing any previous one.
    pub fn register_lister(&mut self, lister: Arc<dyn FeatureLister>) {
        let name = lister.name().to_string();
        if self.listers.insert(name.clone(), lister).is_some() {
            warn!(lister = %name, "replacing registered lister");
        } else {
            info!(lister = %name, "registered lister");
        }
    }

    /// Registers `extractor` under its own name, replacing any previous one.
    pub fn register_extractor(&mut self, extractor: Arc<dyn LayerExtractor>) {
        let name = extractor.name().to_string();
        if self.extractors.insert(name.clone(), extractor).is_some() {
            warn!(extractor = %name, "replacing registered extractor");
        } else {
            info!(extractor = %name, "registered extractor");
        }
    }

    pub fn lister(&self, name: &str) -> Option<Arc<dyn FeatureLister>> {
        self.listers.get(name).cloned()
    }

    pub fn extractor(&self, name: &str) -> Option<Arc<dyn LayerExtractor>> {
        self.extractors.get(name).cloned()
    }

    /// Registered lister names, sorted.
    pub fn lister_names(&self) -> Vec<&str> {
        self.listers.keys().map(String::as_str).collect()
    }

    /// Listers in name order.
    pub fn listers(&self) -> impl Iterator<Item = (&str, &Arc<dyn FeatureLister>)> {
        self.listers.iter().map(|(name, l)| (name.as_str(), l))
    }

    /// Every filename any registered lister needs, deduplicated and sorted.
    pub fn required_filenames(&self) -> Vec<&'static str> {
        self.listers
            .values()
            .flat_map(|l| l.required_filenames().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Extracts `wanted` from `layer` with the extractor named `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownFormat`] if no extractor is
    /// registered under `format`, otherwise whatever the extractor returns.
    pub fn extract_files(
        &self,
        format: &str,
        layer: &mut dyn Read,
        wanted: &[&str],
    ) -> Result<FileMap, ExtractionError> {
        let extractor = self
            .extractors
            .get(format)
            .ok_or_else(|| ExtractionError::UnknownFormat(format.to_string()))?;
        extractor.extract_files(layer, wanted)
    }

    /// Runs every lister over `files` and concatenates their results.
    ///
    /// Stops at the first lister error.
    pub fn list_features(&self, files: &FileMap) -> Result<Vec<FeatureVersion>, ListError> {
        let mut features = Vec::new();
        for lister in self.listers.values() {
            features.extend(lister.list_features(files)?);
        }
        Ok(features)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("listers", &self.listers.keys().collect::<Vec<_>>())
            .field("extractors", &self.extractors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FixedLister {
        name: &'static str,
        files: &'static [&'static str],
        result: fn() -> Result<Vec<FeatureVersion>, ListError>,
    }

    impl FeatureLister for FixedLister {
        fn name(&self) -> &str {
            self.name
        }

        fn required_filenames(&self) -> &[&'static str] {
            self.files
        }

        fn list_features(&self, _files: &FileMap) -> Result<Vec<FeatureVersion>, ListError> {
            (self.result)()
        }
    }

    #[test]
    fn test_defaults() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.lister_names(), vec!["rpmlist"]);
        assert!(registry.lister("rpmlist").is_some());
        assert!(registry.extractor("Legacy").is_some());
        assert!(registry.extractor("Docker").is_none());
        assert_eq!(registry.required_filenames(), vec!["rpmlist"]);
    }

    #[test]
    fn test_required_filenames_union() {
        let mut registry = Registry::with_defaults();
        registry.register_lister(Arc::new(FixedLister {
            name: "dpkg",
            files: &["var/lib/dpkg/status", "rpmlist"],
            result: || Ok(vec![]),
        }));

        assert_eq!(
            registry.required_filenames(),
            vec!["rpmlist", "var/lib/dpkg/status"]
        );
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = Registry::new();
        registry.register_lister(Arc::new(FixedLister {
            name: "rpmlist",
            files: &["rpmlist"],
            result: || Ok(vec![FeatureVersion::new("stub", "1")]),
        }));
        registry.register_lister(Arc::new(RpmListLister::new()));

        assert_eq!(registry.lister_names(), vec!["rpmlist"]);
        assert!(registry.list_features(&FileMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_extractor() {
        let registry = Registry::with_defaults();
        let err = registry
            .extract_files("Docker", &mut Cursor::new(b"{}".to_vec()), &["rpmlist"])
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnknownFormat(ref f) if f == "Docker"));
    }

    #[test]
    fn test_list_features_concatenates_in_name_order() {
        let mut registry = Registry::new();
        registry.register_lister(Arc::new(FixedLister {
            name: "b",
            files: &[],
            result: || Ok(vec![FeatureVersion::new("from-b", "1")]),
        }));
        registry.register_lister(Arc::new(FixedLister {
            name: "a",
            files: &[],
            result: || Ok(vec![FeatureVersion::new("from-a", "1")]),
        }));

        let features = registry.list_features(&FileMap::new()).unwrap();
        assert_eq!(
            features,
            vec![
                FeatureVersion::new("from-a", "1"),
                FeatureVersion::new("from-b", "1"),
            ]
        );
    }

    #[test]
    fn test_list_features_propagates_lister_error() {
        let mut registry = Registry::with_defaults();
        registry.register_lister(Arc::new(FixedLister {
            name: "broken",
            files: &[],
            result: || Err(ListError::Unknown("database locked".to_string())),
        }));

        assert!(registry.list_features(&FileMap::new()).is_err());
    }

    #[test]
    fn test_extract_then_list_round_trip() {
        let registry = Registry::with_defaults();
        let rpmlist = serde_json::json!([
            {"package": "centos-release", "version": "7-1.1503.el7.centos.2.8"},
            {"package": "centos-release", "version": "7-1.1503.el7.centos.2.8"},
            {"package": "gpg-pubkey", "version": "(none):abcdef-4"},
            {"package": "filesystem", "version": "3.2-18.el7"},
            {"package": "broken"},
            {"package": "glibc", "version": "bad:2.17"}
        ])
        .to_string();
        let layer = serde_json::json!({"sysinfo_clair": {"rpmlist": rpmlist}}).to_string();

        let wanted = registry.required_filenames();
        let files = registry
            .extract_files("Legacy", &mut Cursor::new(layer.into_bytes()), &wanted)
            .unwrap();
        let features = registry.list_features(&files).unwrap();

        assert_eq!(
            features,
            vec![
                FeatureVersion::new("centos-release", "7-1.1503.el7.centos.2.8"),
                FeatureVersion::new("filesystem", "3.2-18.el7"),
            ]
        );
    }
}
