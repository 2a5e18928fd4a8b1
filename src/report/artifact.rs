use crate::error::{PrBuilderError, Result};

/// Location prefix of artifacts that can be browsed in the storage console.
pub const STORAGE_ARN_PREFIX: &str = "arn:aws:s3";

/// Opaque artifact location reported by the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef<'a> {
    location: &'a str,
}

impl<'a> ArtifactRef<'a> {
    /// `None` unless the location is a storage ARN; anything else means
    /// "no artifact", not an error.
    pub fn browsable(location: Option<&'a str>) -> Option<Self> {
        location
            .filter(|l| l.starts_with(STORAGE_ARN_PREFIX))
            .map(|location| Self { location })
    }

    pub fn location(&self) -> &str {
        self.location
    }

    /// Console URL for the bucket path, taken from the sixth ARN field.
    pub fn browse_url(&self, region: &str) -> Result<String> {
        let path = self
            .location
            .split(':')
            .nth(5)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                PrBuilderError::Enrichment(format!(
                    "malformed artifact location: {}",
                    self.location
                ))
            })?;

        Ok(format!(
            "https://s3.console.aws.amazon.com/s3/buckets/{}/?region={}&tab=overview",
            path, region
        ))
    }
}
