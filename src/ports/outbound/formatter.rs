use crate::sbom_generation::domain::Document;
use crate::shared::Result;

/// SpdxFormatter port for serializing SPDX documents
///
/// This port abstracts the output encoding (SPDX JSON, tag-value).
/// Implementations must be deterministic: the same document always
/// produces the same bytes.
pub trait SpdxFormatter {
    /// Formats a finished document
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, document: &Document) -> Result<String>;
}
