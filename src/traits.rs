use crate::model::{FeatureVersion, FileMap};
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Malformed package list: {0}")]
    MalformedDocument(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read layer: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed layer document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Unsupported layer format: {0}")]
    UnknownFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,
    #[error("epoch in version is not a number: {0}")]
    InvalidEpoch(String),
    #[error("epoch in version is negative")]
    NegativeEpoch,
    #[error("no version before release")]
    MissingVersion,
    #[error("invalid character {character:?} in {part}")]
    InvalidCharacter { part: &'static str, character: char },
}

/// Turns a [`FileMap`] into the packages installed in a layer, for one
/// package database format.
pub trait FeatureLister: Send + Sync {
    /// Registry identifier (e.g., "rpmlist").
    fn name(&self) -> &str;

    /// Filenames this lister needs in the file map to do any work.
    fn required_filenames(&self) -> &[&'static str];

    /// Lists the features found in `files`.
    ///
    /// A file map without any of the required filenames yields an empty
    /// list, not an error.
    fn list_features(&self, files: &FileMap) -> Result<Vec<FeatureVersion>, ListError>;
}

/// Pulls named files out of a layer blob, for one layer storage format.
pub trait LayerExtractor: Send + Sync {
    /// Registry identifier (e.g., "Legacy").
    fn name(&self) -> &str;

    /// Reads `layer` and returns the entries of `wanted` it contains.
    ///
    /// Wanted filenames absent from the layer are omitted from the map.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the layer cannot be read or is not
    /// a well-formed document of this format.
    fn extract_files(
        &self,
        layer: &mut dyn Read,
        wanted: &[&str],
    ) -> Result<FileMap, ExtractionError>;
}

/// Checks version strings against one ecosystem's version syntax.
pub trait VersionFormat: Send + Sync {
    /// Format identifier (e.g., "rpm").
    fn name(&self) -> &'static str;

    fn validate(&self, version: &str) -> Result<(), VersionError>;
}
