use crate::ports::outbound::InspectionOptions;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Default number of artifacts inspected concurrently
pub const DEFAULT_WORKERS: usize = 4;

/// An artifact to put into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Image reference pulled from its registry
    Image(String),
    /// Local docker-archive or OCI layout tarball
    Tarball(PathBuf),
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::Image(reference) => write!(f, "{}", reference),
            ArtifactSource::Tarball(path) => write!(f, "{}", path.display()),
        }
    }
}

/// GenerateDocumentRequest - Internal request DTO for document generation
#[derive(Debug, Clone)]
pub struct GenerateDocumentRequest {
    /// Artifacts in the order they are merged into the document
    pub artifacts: Vec<ArtifactSource>,
    /// Provenance statements to correlate against the document
    pub provenance: Vec<PathBuf>,
    pub document_name: Option<String>,
    pub namespace: Option<String>,
    /// Extra SPDX creators next to the tool itself (`Person: ...`, `Organization: ...`)
    pub creators: Vec<String>,
    pub created: DateTime<Utc>,
    pub workers: usize,
    pub options: InspectionOptions,
}

impl GenerateDocumentRequest {
    pub fn new(artifacts: Vec<ArtifactSource>, created: DateTime<Utc>) -> Self {
        Self {
            artifacts,
            provenance: Vec::new(),
            document_name: None,
            namespace: None,
            creators: Vec::new(),
            created,
            workers: DEFAULT_WORKERS,
            options: InspectionOptions::default(),
        }
    }

    /// Document name: the explicit one, or the first artifact's name
    pub fn resolved_name(&self) -> String {
        if let Some(name) = self.document_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.artifacts.first() {
            Some(ArtifactSource::Image(reference)) => reference.clone(),
            Some(ArtifactSource::Tarball(path)) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "artifacts".to_string()),
            None => "empty".to_string(),
        }
    }
}
