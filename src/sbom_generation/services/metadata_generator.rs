use crate::sbom_generation::domain::DocumentMetadata;
use crate::shared::error::SbomError;
use crate::shared::Result;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use sha2::{Digest, Sha256};

/// Prefix of generated document namespaces
pub const NAMESPACE_BASE: &str = "https://spdx.org/spdxdocs";

/// MetadataGenerator service for SPDX document creation info
///
/// Pure business logic: the clock value is passed in, so two runs with the
/// same inputs produce the same metadata.
pub struct MetadataGenerator;

impl MetadataGenerator {
    /// Generates document metadata
    ///
    /// # Arguments
    /// * `name` - Document name
    /// * `namespace` - Explicit namespace; derived from the artifact list when `None`
    /// * `artifacts` - References of all requested artifacts, in request order
    /// * `creators` - Additional creators (`Organization: ...`, `Person: ...`)
    /// * `created` - Creation time, truncated to seconds
    pub fn generate_metadata(
        name: &str,
        namespace: Option<&str>,
        artifacts: &[String],
        creators: &[String],
        created: DateTime<Utc>,
    ) -> DocumentMetadata {
        let namespace = namespace
            .map(str::to_string)
            .unwrap_or_else(|| Self::derive_namespace(name, artifacts));

        let mut all_creators = vec![format!("Tool: spdx-bom-{}", env!("CARGO_PKG_VERSION"))];
        all_creators.extend(creators.iter().cloned());

        DocumentMetadata::new(
            name.to_string(),
            namespace,
            created.to_rfc3339_opts(SecondsFormat::Secs, true),
            all_creators,
        )
    }

    /// `<base>/<percent-encoded name>-<sha256 of the artifact list>`
    pub fn derive_namespace(name: &str, artifacts: &[String]) -> String {
        let mut hasher = Sha256::new();
        for artifact in artifacts {
            hasher.update(artifact.as_bytes());
            hasher.update([b'\n']);
        }
        format!(
            "{}/{}-{}",
            NAMESPACE_BASE,
            urlencoding::encode(name),
            hex::encode(hasher.finalize())
        )
    }

    /// Resolves the creation time from a `SOURCE_DATE_EPOCH` value
    ///
    /// # Errors
    /// Returns [`SbomError::Validation`] if the value is not a Unix timestamp
    pub fn creation_time(source_date_epoch: Option<&str>) -> Result<DateTime<Utc>> {
        let Some(value) = source_date_epoch else {
            return Ok(Utc::now());
        };

        let seconds: i64 = value.trim().parse().map_err(|_| SbomError::Validation {
            message: format!("SOURCE_DATE_EPOCH must be a Unix timestamp, got '{}'", value),
        })?;

        Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            SbomError::Validation {
                message: format!("SOURCE_DATE_EPOCH is out of range: {}", seconds),
            }
            .into()
        })
    }
}
