//! spdx-bom - SPDX document generation and provenance correlation for container images
//!
//! This library inspects container images (pulled from a registry or read from
//! local tarballs), merges them into a single SPDX 2.3 document and correlates
//! the document against in-toto provenance statements, following hexagonal
//! architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases and application services
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use spdx_bom::prelude::*;
//! use std::path::PathBuf;
//!
//! # async fn run() -> Result<()> {
//! // Create use case with injected adapters
//! let use_case = GenerateDocumentUseCase::new(
//!     ImageInspector::new(),
//!     FileSystemReader::new(),
//!     StderrProgressReporter::new(),
//! );
//!
//! // Execute
//! let created = MetadataGenerator::creation_time(None)?;
//! let mut request = GenerateDocumentRequest::new(
//!     vec![ArtifactSource::Image("alpine:3.19".to_string())],
//!     created,
//! );
//! request.provenance = vec![PathBuf::from("provenance.intoto.json")];
//! let response = use_case.execute(request).await?;
//!
//! // Format output
//! let output = SpdxJsonFormatter::new().format(&response.document)?;
//! println!("{}", output);
//! assert!(response.is_verified());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{StderrProgressReporter, VerificationSummary};
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{SpdxJsonFormatter, TagValueFormatter};
    pub use crate::adapters::outbound::inspection::{
        ImageInspector, RegistryClient, TarballInspector,
    };
    pub use crate::application::dto::{
        ArtifactOutcome, ArtifactSource, GenerateDocumentRequest, GenerateDocumentResponse,
        OutputFormat,
    };
    pub use crate::application::use_cases::{GenerateDocumentUseCase, InspectArtifactUseCase};
    pub use crate::ports::outbound::{
        ArtifactInspector, ExtractedTarball, InspectionOptions, OutputPresenter,
        ProgressReporter, SpdxFormatter, StatementReader,
    };
    pub use crate::sbom_generation::domain::{
        ArtifactFile, ArtifactPackage, ChecksumAlgorithm, Checksums, CorrelationReport, Document,
        PackagePurpose, Statement, Verdict,
    };
    pub use crate::sbom_generation::services::{
        DigestCorrelator, GraphBuilder, IdRegistry, MetadataGenerator,
    };
    pub use crate::shared::Result;
}
