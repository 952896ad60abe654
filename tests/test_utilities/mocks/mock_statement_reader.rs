use spdx_bom::prelude::*;
use spdx_bom::sbom_generation::domain::StatementError;
use spdx_bom::shared::error::SbomError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mock StatementReader serving in-memory statement JSON by path
#[derive(Default)]
pub struct MockStatementReader {
    statements: HashMap<PathBuf, String>,
}

impl MockStatementReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, path: &str, json: impl Into<String>) -> Self {
        self.statements.insert(PathBuf::from(path), json.into());
        self
    }
}

impl StatementReader for MockStatementReader {
    fn load_statement(&self, path: &Path) -> Result<Statement> {
        let json = self.statements.get(path).ok_or_else(|| SbomError::FileReadError {
            path: path.to_path_buf(),
            details: "no such statement".to_string(),
        })?;

        Statement::from_json(json).map_err(|e| {
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
