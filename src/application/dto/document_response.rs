use crate::sbom_generation::domain::{CorrelationReport, Document};

/// What happened to one requested artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Merged into the document under this top-level package
    Added { artifact: String, spdx_id: String },
    /// Left out of the document
    Failed { artifact: String, error: String },
}

impl ArtifactOutcome {
    pub fn artifact(&self) -> &str {
        match self {
            ArtifactOutcome::Added { artifact, .. } | ArtifactOutcome::Failed { artifact, .. } => artifact,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ArtifactOutcome::Failed { .. })
    }
}

/// GenerateDocumentResponse - Internal response DTO for document generation
///
/// The document holds every artifact that succeeded; failed artifacts are
/// only listed in `outcomes`.
#[derive(Debug)]
pub struct GenerateDocumentResponse {
    pub document: Document,
    /// One entry per requested artifact, in request order
    pub outcomes: Vec<ArtifactOutcome>,
    pub correlation: CorrelationReport,
}

impl GenerateDocumentResponse {
    pub fn new(document: Document, outcomes: Vec<ArtifactOutcome>, correlation: CorrelationReport) -> Self {
        Self {
            document,
            outcomes,
            correlation,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// True when every artifact made it into the document and no material
    /// digest disagrees with it
    pub fn is_verified(&self) -> bool {
        !self.has_failures() && !self.correlation.has_mismatch()
    }
}
