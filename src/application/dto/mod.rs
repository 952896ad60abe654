/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod document_request;
mod document_response;
mod output_format;

pub use document_request::{ArtifactSource, GenerateDocumentRequest, DEFAULT_WORKERS};
pub use document_response::{ArtifactOutcome, GenerateDocumentResponse};
pub use output_format::OutputFormat;
