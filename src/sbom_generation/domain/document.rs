use super::{File, Package, Relationship, RelationshipType};

/// SPDX ID of the document itself
pub const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";

pub const SPDX_VERSION: &str = "SPDX-2.3";

pub const DATA_LICENSE: &str = "CC0-1.0";

/// DocumentMetadata value object: creation info of an SPDX document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    name: String,
    namespace: String,
    created: String,
    creators: Vec<String>,
}

impl DocumentMetadata {
    pub fn new(name: String, namespace: String, created: String, creators: Vec<String>) -> Self {
        Self {
            name,
            namespace,
            created,
            creators,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// RFC 3339 creation timestamp (UTC, second precision)
    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn creators(&self) -> &[String] {
        &self.creators
    }

    pub fn spdx_version(&self) -> &'static str {
        SPDX_VERSION
    }

    pub fn data_license(&self) -> &'static str {
        DATA_LICENSE
    }
}

/// Document aggregate: the root of the SPDX graph.
///
/// Only [`crate::sbom_generation::services::GraphBuilder`] creates documents;
/// afterwards they are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    metadata: DocumentMetadata,
    packages: Vec<Package>,
    files: Vec<File>,
    relationships: Vec<Relationship>,
}

impl Document {
    pub(crate) fn new(
        metadata: DocumentMetadata,
        packages: Vec<Package>,
        files: Vec<File>,
        relationships: Vec<Relationship>,
    ) -> Self {
        Self {
            metadata,
            packages,
            files,
            relationships,
        }
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn package(&self, spdx_id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.spdx_id() == spdx_id)
    }

    pub fn file(&self, spdx_id: &str) -> Option<&File> {
        self.files.iter().find(|f| f.spdx_id() == spdx_id)
    }

    /// Packages the document DESCRIBES, in document order
    pub fn described_packages(&self) -> Vec<&Package> {
        self.relationships
            .iter()
            .filter(|r| r.from == DOCUMENT_ID && r.relationship_type == RelationshipType::Describes)
            .filter_map(|r| self.package(&r.to))
            .collect()
    }

    /// Direct CONTAINS children of an entity
    pub fn contained_in(&self, spdx_id: &str) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|r| r.from == spdx_id && r.relationship_type == RelationshipType::Contains)
            .map(|r| r.to.as_str())
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.packages.len() + self.files.len()
    }
}
