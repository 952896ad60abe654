use crate::shared::Result;

/// Destination of a serialized SPDX document
pub trait OutputPresenter {
    /// Writes the serialized document in one piece
    ///
    /// # Errors
    /// Returns [`crate::shared::error::SbomError::FileWriteError`] when a
    /// file destination cannot be written. A failed write never leaves a
    /// truncated document behind.
    fn present(&self, document: &str) -> Result<()>;

    /// Where the document goes, for the completion message
    fn destination(&self) -> String;
}
