use crate::sbom_generation::domain::{Document, RelationshipType, DOCUMENT_ID};
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::{HashMap, HashSet, VecDeque};

/// GraphValidator checks the structural invariants of a finished document.
///
/// A violation here means the builder produced a broken graph, so every
/// failure is reported as [`SbomError::Invariant`] and treated as fatal.
pub struct GraphValidator;

impl GraphValidator {
    pub fn validate(document: &Document) -> Result<()> {
        let ids = Self::check_unique_ids(document)?;
        Self::check_endpoints(document, &ids)?;
        Self::check_describes(document)?;
        Self::check_files_are_leaves(document)?;
        Self::check_acyclic(document)?;
        Self::check_reachable(document)?;
        Ok(())
    }

    fn check_unique_ids(document: &Document) -> Result<HashSet<&str>> {
        let mut ids = HashSet::new();
        let all_ids = document
            .packages()
            .iter()
            .map(|p| p.spdx_id())
            .chain(document.files().iter().map(|f| f.spdx_id()));

        for id in all_ids {
            if id == DOCUMENT_ID || !ids.insert(id) {
                return Err(violation("unique-ids", format!("SPDX ID '{}' is used twice", id)));
            }
        }
        Ok(ids)
    }

    fn check_endpoints(document: &Document, ids: &HashSet<&str>) -> Result<()> {
        for relationship in document.relationships() {
            for endpoint in [&relationship.from, &relationship.to] {
                if endpoint != DOCUMENT_ID && !ids.contains(endpoint.as_str()) {
                    return Err(violation(
                        "no-dangling-references",
                        format!("'{}' references unknown ID '{}'", relationship, endpoint),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_describes(document: &Document) -> Result<()> {
        let mut described: HashMap<&str, usize> = HashMap::new();
        for relationship in document.relationships() {
            let involves_document = relationship.from == DOCUMENT_ID || relationship.to == DOCUMENT_ID;
            let is_describes = relationship.relationship_type == RelationshipType::Describes;

            if is_describes != involves_document || relationship.to == DOCUMENT_ID {
                return Err(violation(
                    "describes-from-document",
                    format!("unexpected relationship '{}'", relationship),
                ));
            }
            if is_describes {
                if document.package(&relationship.to).is_none() {
                    return Err(violation(
                        "describes-from-document",
                        format!("'{}' does not target a package", relationship),
                    ));
                }
                *described.entry(relationship.to.as_str()).or_default() += 1;
            }
        }

        if let Some((id, _)) = described.iter().find(|(_, count)| **count > 1) {
            return Err(violation(
                "single-describes",
                format!("'{}' is described more than once", id),
            ));
        }
        Ok(())
    }

    fn check_files_are_leaves(document: &Document) -> Result<()> {
        for relationship in document.relationships() {
            if document.file(&relationship.from).is_some() {
                return Err(violation(
                    "files-are-leaves",
                    format!("file has outgoing relationship '{}'", relationship),
                ));
            }
        }
        Ok(())
    }

    /// Iterative three-color DFS over CONTAINS and DEPENDS_ON edges
    fn check_acyclic(document: &Document) -> Result<()> {
        let adjacency = structural_adjacency(document);

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        let mut starts: Vec<&str> = adjacency.keys().copied().collect();
        starts.sort_unstable();

        for start in starts {
            if marks.contains_key(start) {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            marks.insert(start, Mark::InProgress);

            while let Some((node, next)) = stack.last_mut() {
                let children = adjacency.get(*node).map(Vec::as_slice).unwrap_or(&[]);
                if let Some(child) = children.get(*next).copied() {
                    *next += 1;
                    match marks.get(child) {
                        Some(Mark::InProgress) => {
                            return Err(violation(
                                "acyclic",
                                format!("cycle through '{}' and '{}'", node, child),
                            ));
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::InProgress);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    marks.insert(*node, Mark::Done);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    fn check_reachable(document: &Document) -> Result<()> {
        let adjacency = structural_adjacency(document);

        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = document
            .relationships()
            .iter()
            .filter(|r| r.relationship_type == RelationshipType::Describes)
            .map(|r| r.to.as_str())
            .collect();

        while let Some(id) = queue.pop_front() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(children) = adjacency.get(id) {
                queue.extend(children.iter().copied());
            }
        }

        let orphan = document
            .packages()
            .iter()
            .map(|p| p.spdx_id())
            .chain(document.files().iter().map(|f| f.spdx_id()))
            .find(|id| !reached.contains(id));

        match orphan {
            Some(id) => Err(violation(
                "no-orphans",
                format!("'{}' is not reachable from the document", id),
            )),
            None => Ok(()),
        }
    }
}

fn structural_adjacency(document: &Document) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for relationship in document
        .relationships()
        .iter()
        .filter(|r| r.relationship_type.is_structural())
    {
        adjacency
            .entry(relationship.from.as_str())
            .or_default()
            .push(relationship.to.as_str());
    }
    adjacency
}

fn violation(invariant: &'static str, details: String) -> anyhow::Error {
    SbomError::Invariant { invariant, details }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::{
        Checksums, DocumentMetadata, Entity, File, Package, PackagePurpose, Relationship,
    };

    fn package(id: &str) -> Package {
        Package {
            entity: Entity::new(id.to_string(), id.to_string(), Checksums::new()),
            version: None,
            purpose: PackagePurpose::Container,
            download_location: None,
            purl: None,
            files_analyzed: false,
        }
    }

    fn file(id: &str) -> File {
        File {
            entity: Entity::new(id.to_string(), id.to_string(), Checksums::new()),
            size: 0,
        }
    }

    fn document(packages: Vec<Package>, files: Vec<File>, relationships: Vec<Relationship>) -> Document {
        let metadata = DocumentMetadata::new(
            "doc".to_string(),
            "ns".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
            vec![],
        );
        Document::new(metadata, packages, files, relationships)
    }

    fn invariant_of(result: Result<()>) -> &'static str {
        let err = result.unwrap_err();
        match err.downcast_ref::<SbomError>() {
            Some(SbomError::Invariant { invariant, .. }) => invariant,
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    fn describes(id: &str) -> Relationship {
        Relationship::new(DOCUMENT_ID, RelationshipType::Describes, id)
    }

    fn contains(from: &str, to: &str) -> Relationship {
        Relationship::new(from, RelationshipType::Contains, to)
    }

    #[test]
    fn test_valid_tree() {
        let doc = document(
            vec![package("A"), package("L")],
            vec![file("F")],
            vec![describes("A"), contains("A", "L"), contains("L", "F")],
        );
        assert!(GraphValidator::validate(&doc).is_ok());
    }

    #[test]
    fn test_orphan_detected() {
        let doc = document(
            vec![package("A"), package("B")],
            vec![],
            vec![describes("A")],
        );
        assert_eq!(invariant_of(GraphValidator::validate(&doc)), "no-orphans");
    }

    #[test]
    fn test_cycle_detected() {
        let doc = document(
            vec![package("A"), package("B"), package("C")],
            vec![],
            vec![
                describes("A"),
                contains("A", "B"),
                contains("B", "C"),
                Relationship::new("C", RelationshipType::DependsOn, "B"),
            ],
        );
        assert_eq!(invariant_of(GraphValidator::validate(&doc)), "acyclic");
    }

    #[test]
    fn test_dangling_reference_detected() {
        let doc = document(
            vec![package("A")],
            vec![],
            vec![describes("A"), contains("A", "missing")],
        );
        assert_eq!(
            invariant_of(GraphValidator::validate(&doc)),
            "no-dangling-references"
        );
    }

    #[test]
    fn test_duplicate_id_detected() {
        let doc = document(vec![package("A")], vec![file("A")], vec![describes("A")]);
        assert_eq!(invariant_of(GraphValidator::validate(&doc)), "unique-ids");
    }

    #[test]
    fn test_double_describes_detected() {
        let doc = document(vec![package("A")], vec![], vec![describes("A"), describes("A")]);
        assert_eq!(invariant_of(GraphValidator::validate(&doc)), "single-describes");
    }

    #[test]
    fn test_describes_between_packages_rejected() {
        let doc = document(
            vec![package("A"), package("B")],
            vec![],
            vec![
                describes("A"),
                contains("A", "B"),
                Relationship::new("A", RelationshipType::Describes, "B"),
            ],
        );
        assert_eq!(
            invariant_of(GraphValidator::validate(&doc)),
            "describes-from-document"
        );
    }

    #[test]
    fn test_file_with_children_rejected() {
        let doc = document(
            vec![package("A"), package("B")],
            vec![file("F")],
            vec![describes("A"), contains("A", "F"), contains("F", "B")],
        );
        assert_eq!(invariant_of(GraphValidator::validate(&doc)), "files-are-leaves");
    }
}
