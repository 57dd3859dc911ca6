//! Extractor for "Legacy" layers: a single JSON document carrying the
//! layer's files as strings under the `sysinfo_clair` key.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

use crate::model::FileMap;
use crate::traits::{ExtractionError, LayerExtractor};

// Contents stay strings so line endings survive the round trip.
#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(rename = "sysinfo_clair")]
    files: HashMap<String, String>,
}

/// [`LayerExtractor`] for the `Legacy` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyExtractor;

impl LegacyExtractor {
    pub const NAME: &'static str = "Legacy";
}

impl LayerExtractor for LegacyExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn extract_files(
        &self,
        layer: &mut dyn Read,
        wanted: &[&str],
    ) -> Result<FileMap, ExtractionError> {
        let mut content = Vec::new();
        layer.read_to_end(&mut content)?;

        let mut document: LegacyDocument = serde_json::from_slice(&content)?;

        let files: FileMap = wanted
            .iter()
            .filter_map(|name| {
                document
                    .files
                    .remove_entry(*name)
                    .map(|(name, content)| (name, content.into_bytes()))
            })
            .collect();

        debug!(
            layer_bytes = content.len(),
            wanted = wanted.len(),
            extracted = files.len(),
            "extracted legacy layer files"
        );
        Ok(files)
    }
}
