use crate::ports::outbound::StatementReader;
use crate::sbom_generation::domain::{Statement, StatementError};
use crate::shared::error::SbomError;
use crate::shared::security::{read_checked_file, MAX_STATEMENT_SIZE};
use crate::shared::Result;
use std::path::Path;

/// FileSystemReader adapter for reading provenance statements from disk
///
/// Files go through the shared security checks (no symlinks, regular files
/// only, size limit) before they are parsed.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementReader for FileSystemReader {
    fn load_statement(&self, path: &Path) -> Result<Statement> {
        let content = read_checked_file(path, "Provenance statement", MAX_STATEMENT_SIZE)?;

        Statement::from_json(&content).map_err(|e| {
            match e {
                StatementError::Parse(details) => SbomError::StatementParse {
                    path: path.to_path_buf(),
                    details,
                },
                StatementError::Validation(reason) => SbomError::StatementValidation {
                    path: path.to_path_buf(),
                    reason,
                },
            }
            .into()
        })
    }
}
