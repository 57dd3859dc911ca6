//! RPM `[epoch:]version[-release]` syntax.

use crate::traits::{VersionError, VersionFormat};
use crate::versionfmt::{MAX_VERSION, MIN_VERSION};

const ALLOWED_SYMBOLS: &[char] = &['.', '-', '+', '~', ':', '_'];

/// Validator for RPM package versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpmVersionFormat;

impl RpmVersionFormat {
    pub const NAME: &'static str = "rpm";
}

impl VersionFormat for RpmVersionFormat {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, version: &str) -> Result<(), VersionError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }
        if version == MIN_VERSION || version == MAX_VERSION {
            return Ok(());
        }

        let rest = match version.split_once(':') {
            Some((epoch, rest)) => {
                let epoch: i64 = epoch
                    .parse()
                    .map_err(|_| VersionError::InvalidEpoch(epoch.to_string()))?;
                if epoch < 0 {
                    return Err(VersionError::NegativeEpoch);
                }
                rest
            }
            None => version,
        };

        let (upstream, release) = rest.split_once('-').unwrap_or((rest, ""));
        if upstream.is_empty() {
            return Err(VersionError::MissingVersion);
        }

        check_characters("version", upstream)?;
        check_characters("release", release)
    }
}

fn check_characters(part: &'static str, s: &str) -> Result<(), VersionError> {
    match s
        .chars()
        .find(|c| !c.is_alphanumeric() && !ALLOWED_SYMBOLS.contains(c))
    {
        Some(character) => Err(VersionError::InvalidCharacter { part, character }),
        None => Ok(()),
    }
}
