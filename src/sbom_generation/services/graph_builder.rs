use crate::sbom_generation::domain::{
    ArtifactPackage, Document, DocumentMetadata, Entity, File, Package, Relationship,
    RelationshipType, DOCUMENT_ID,
};
use crate::sbom_generation::services::{GraphValidator, IdRegistry};
use crate::shared::error::{is_fatal, SbomError};
use crate::shared::Result;
use std::collections::{HashMap, HashSet, VecDeque};

/// Maximum package nesting depth accepted from a provider
const MAX_NESTING_DEPTH: usize = 32;

/// Entities and edges of one artifact, committed only when complete
#[derive(Default)]
struct StagedGraph {
    packages: Vec<Package>,
    files: Vec<File>,
    relationships: Vec<Relationship>,
}

/// GraphBuilder accumulates inspected artifacts into one SPDX document.
///
/// The builder is the single writer of the document: the merge pass owns it
/// by value and consumes it with [`GraphBuilder::finish`]. Every artifact
/// becomes an independent subgraph under its own top-level package.
pub struct GraphBuilder {
    metadata: DocumentMetadata,
    registry: IdRegistry,
    packages: Vec<Package>,
    files: Vec<File>,
    relationships: Vec<Relationship>,
    artifact_count: usize,
}

impl GraphBuilder {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            registry: IdRegistry::new(),
            packages: Vec::new(),
            files: Vec::new(),
            relationships: Vec::new(),
            artifact_count: 0,
        }
    }

    /// Adds one inspected artifact as a new top-level package
    ///
    /// Either the whole subgraph is added or nothing is: on failure the
    /// registry is rolled back and no entity of the artifact remains.
    ///
    /// # Returns
    /// The SPDX ID of the artifact's top-level package
    ///
    /// # Errors
    /// - [`SbomError::GraphBuild`] wrapping the cause when the artifact is rejected
    /// - [`SbomError::IdCollision`] unwrapped, since it is fatal to the run
    pub fn add_artifact(&mut self, artifact: ArtifactPackage) -> Result<String> {
        let checkpoint = self.registry.clone();
        let mut staged = StagedGraph::default();

        match self.stage_package(&artifact, DOCUMENT_ID, 0, &mut staged) {
            Ok(root_id) => {
                self.relationships.push(Relationship::new(
                    DOCUMENT_ID,
                    RelationshipType::Describes,
                    root_id.clone(),
                ));
                self.packages.extend(staged.packages);
                self.files.extend(staged.files);
                self.relationships.extend(staged.relationships);
                self.artifact_count += 1;
                Ok(root_id)
            }
            Err(e) => {
                self.registry = checkpoint;
                if is_fatal(&e) {
                    Err(e)
                } else {
                    Err(SbomError::GraphBuild {
                        artifact: artifact.name.clone(),
                        source: e,
                    }
                    .into())
                }
            }
        }
    }

    /// Number of artifacts merged so far
    pub fn artifact_count(&self) -> usize {
        self.artifact_count
    }

    /// Finishes construction and checks the graph invariants
    ///
    /// # Errors
    /// Returns [`SbomError::Invariant`] if the graph has a cycle, an orphan
    /// or a dangling reference
    pub fn finish(self) -> Result<Document> {
        let document = Document::new(self.metadata, self.packages, self.files, self.relationships);
        GraphValidator::validate(&document)?;
        Ok(document)
    }

    fn stage_package(
        &mut self,
        artifact: &ArtifactPackage,
        parent_path: &str,
        depth: usize,
        staged: &mut StagedGraph,
    ) -> Result<String> {
        if depth > MAX_NESTING_DEPTH {
            anyhow::bail!(
                "Package nesting exceeds {} levels at '{}'",
                MAX_NESTING_DEPTH,
                artifact.name
            );
        }
        if artifact.name.trim().is_empty() {
            anyhow::bail!("Package under '{}' has an empty name", parent_path);
        }

        let package_id = self.registry.register(
            artifact.purpose.id_kind(),
            &artifact.name,
            &artifact.checksums,
            parent_path,
        )?;

        let mut entity = Entity::new(
            package_id.clone(),
            artifact.name.clone(),
            artifact.checksums.clone(),
        );
        entity.license_declared = artifact.license_declared.clone();
        entity.copyright_text = artifact.copyright_text.clone();
        entity.supplier = artifact.supplier.clone();

        staged.packages.push(Package {
            entity,
            version: artifact.version.clone(),
            purpose: artifact.purpose,
            download_location: artifact.download_location.clone(),
            purl: artifact.purl.clone(),
            files_analyzed: !artifact.files.is_empty(),
        });

        for file in &artifact.files {
            if file.path.trim().is_empty() {
                anyhow::bail!("File in package '{}' has an empty path", artifact.name);
            }
            let file_id = self
                .registry
                .register("File", &file.path, &file.checksums, &package_id)?;
            staged.files.push(File {
                entity: Entity::new(file_id.clone(), file.path.clone(), file.checksums.clone()),
                size: file.size,
            });
            staged.relationships.push(Relationship::new(
                package_id.clone(),
                RelationshipType::Contains,
                file_id,
            ));
        }

        let mut child_ids: HashMap<&str, String> = HashMap::new();
        for child in &artifact.packages {
            let child_id = self.stage_package(child, &package_id, depth + 1, staged)?;
            staged.relationships.push(Relationship::new(
                package_id.clone(),
                RelationshipType::Contains,
                child_id.clone(),
            ));
            child_ids.entry(child.name.as_str()).or_insert(child_id);
        }

        for child in &artifact.packages {
            let Some(from) = child_ids.get(child.name.as_str()) else {
                continue;
            };
            for dependency in &child.depends_on {
                let Some(to) = child_ids.get(dependency.as_str()) else {
                    continue;
                };
                if !closes_cycle(&staged.relationships, from, to) {
                    staged.relationships.push(Relationship::new(
                        from.clone(),
                        RelationshipType::DependsOn,
                        to.clone(),
                    ));
                }
            }
        }

        Ok(package_id)
    }
}

/// Whether adding `from -> to` would close a cycle over structural edges
fn closes_cycle(relationships: &[Relationship], from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }

    let mut queue = VecDeque::from([to]);
    let mut seen: HashSet<&str> = HashSet::from([to]);
    while let Some(current) = queue.pop_front() {
        for edge in relationships
            .iter()
            .filter(|r| r.relationship_type.is_structural() && r.from == current)
        {
            if edge.to == from {
                return true;
            }
            if seen.insert(edge.to.as_str()) {
                queue.push_back(edge.to.as_str());
            }
        }
    }
    false
}
