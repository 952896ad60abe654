pub mod artifact;
pub mod checksum;
pub mod correlation;
pub mod document;
pub mod entity;
pub mod provenance;
pub mod relationship;

pub use artifact::{ArtifactFile, ArtifactPackage, PackagePurpose};
pub use checksum::{ChecksumAlgorithm, Checksums};
pub use correlation::{CorrelationEntry, CorrelationReport, Verdict};
pub use document::{Document, DocumentMetadata, DOCUMENT_ID};
pub use entity::{Entity, File, Package, NOASSERTION};
pub use provenance::{Builder, DigestSet, Material, Predicate, Statement, StatementError, Subject};
pub use relationship::{Relationship, RelationshipType};
