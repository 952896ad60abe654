/// Use cases module containing application business logic orchestration
mod generate_document;
mod inspect_artifact;

pub use generate_document::GenerateDocumentUseCase;
pub use inspect_artifact::InspectArtifactUseCase;
