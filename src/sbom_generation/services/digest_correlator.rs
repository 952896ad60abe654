use crate::sbom_generation::domain::checksum::checksums_from_digest_set;
use crate::sbom_generation::domain::{
    CorrelationEntry, CorrelationReport, Document, Material, Package, Statement, Verdict,
};
use crate::sbom_generation::policies::ChecksumPriority;
use std::collections::HashSet;

/// DigestCorrelator cross-checks provenance materials against a document.
///
/// Pure in-memory computation: the document and statements are only
/// borrowed, and every outcome (including a mismatch) is returned as data.
pub struct DigestCorrelator;

impl DigestCorrelator {
    /// Correlates every material of every statement with the document
    ///
    /// Entries are ordered by statement, then material, then package in
    /// document order; unclaimed packages come last.
    pub fn correlate(document: &Document, statements: &[Statement]) -> CorrelationReport {
        let mut entries = Vec::new();
        let mut claimed: HashSet<&str> = HashSet::new();

        for statement in statements {
            for material in statement.materials() {
                let matches: Vec<&Package> = document
                    .packages()
                    .iter()
                    .filter(|package| package_matches(package, &material.uri))
                    .collect();

                if matches.is_empty() {
                    entries.push(CorrelationEntry {
                        verdict: Verdict::Inconclusive,
                        package_id: None,
                        material_uri: Some(material.uri.clone()),
                        builder_id: Some(statement.builder_id().to_string()),
                        algorithm: None,
                        expected: None,
                        actual: None,
                    });
                    continue;
                }

                for package in matches {
                    claimed.insert(package.spdx_id());
                    entries.push(Self::compare(package, material, statement.builder_id()));
                }
            }
        }

        for package in document.packages() {
            if package.download_location.is_some() && !claimed.contains(package.spdx_id()) {
                entries.push(CorrelationEntry::unclaimed(package.spdx_id()));
            }
        }

        CorrelationReport::new(entries)
    }

    /// Compares one package with one material on their strongest common algorithm
    fn compare(package: &Package, material: &Material, builder_id: &str) -> CorrelationEntry {
        let claimed = checksums_from_digest_set(&material.digest);
        let computed = &package.entity.checksums;

        let mut entry = CorrelationEntry {
            verdict: Verdict::Inconclusive,
            package_id: Some(package.spdx_id().to_string()),
            material_uri: Some(material.uri.clone()),
            builder_id: Some(builder_id.to_string()),
            algorithm: None,
            expected: None,
            actual: None,
        };

        let Some(algorithm) = ChecksumPriority::strongest_common(computed, &claimed) else {
            return entry;
        };

        let expected = &claimed[&algorithm];
        let actual = &computed[&algorithm];
        entry.verdict = if expected.eq_ignore_ascii_case(actual) {
            Verdict::Verified
        } else {
            Verdict::Mismatch
        };
        entry.algorithm = Some(algorithm);
        entry.expected = Some(expected.clone());
        entry.actual = Some(actual.clone());
        entry
    }
}

fn package_matches(package: &Package, material_uri: &str) -> bool {
    let uri = normalize_uri(material_uri);
    if uri.is_empty() {
        return false;
    }
    [package.download_location.as_deref(), package.purl.as_deref()]
        .into_iter()
        .flatten()
        .any(|source| normalize_uri(source) == uri)
}

/// Normalizes a source URI for comparison
///
/// Trims whitespace, a trailing `/` and a `docker://` scheme. Nothing else
/// is rewritten; host case and default registries are compared verbatim.
fn normalize_uri(uri: &str) -> &str {
    let uri = uri.trim();
    let uri = uri.strip_prefix("docker://").unwrap_or(uri);
    uri.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::{
        ArtifactPackage, ChecksumAlgorithm, Checksums, DigestSet, DocumentMetadata,
        PackagePurpose, Predicate, Subject,
    };
    use crate::sbom_generation::services::GraphBuilder;

    const IMAGE_URI: &str = "docker.io/library/alpine:3.19";

    fn document(checksums: Checksums) -> Document {
        let metadata = DocumentMetadata::new(
            "doc".to_string(),
            "ns".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
            vec![],
        );
        let mut builder = GraphBuilder::new(metadata);
        builder
            .add_artifact(
                ArtifactPackage::new("alpine", PackagePurpose::Container)
                    .with_checksums(checksums)
                    .with_download_location(IMAGE_URI)
                    .with_purl("pkg:oci/alpine@sha256%3Aaa"),
            )
            .unwrap();
        builder.finish().unwrap()
    }

    fn statement(uri: &str, digest: &[(&str, &str)]) -> Statement {
        let digest: DigestSet = digest
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Statement {
            statement_type: None,
            predicate_type: None,
            subject: vec![Subject::new("out", DigestSet::new())],
            predicate: Predicate {
                builder: crate::sbom_generation::domain::Builder {
                    id: "builder".to_string(),
                    extra: Default::default(),
                },
                materials: vec![Material::new(uri, digest)],
                extra: Default::default(),
            },
            extra: Default::default(),
        }
    }

    fn checksums(entries: &[(ChecksumAlgorithm, &str)]) -> Checksums {
        entries.iter().map(|(a, v)| (*a, v.to_string())).collect()
    }

    #[test]
    fn test_equal_digest_is_verified() {
        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(&doc, &[statement(IMAGE_URI, &[("sha256", "abcd")])]);

        assert_eq!(report.entries().len(), 1);
        let entry = &report.entries()[0];
        assert_eq!(entry.verdict, Verdict::Verified);
        assert_eq!(entry.algorithm, Some(ChecksumAlgorithm::Sha256));
        assert_eq!(entry.builder_id.as_deref(), Some("builder"));
    }

    #[test]
    fn test_one_digit_change_is_mismatch() {
        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(&doc, &[statement(IMAGE_URI, &[("sha256", "abce")])]);

        assert!(report.has_mismatch());
        let entry = &report.entries()[0];
        assert_eq!(entry.expected.as_deref(), Some("abce"));
        assert_eq!(entry.actual.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_strongest_common_algorithm_decides() {
        let doc = document(checksums(&[
            (ChecksumAlgorithm::Sha1, "1111"),
            (ChecksumAlgorithm::Sha256, "2222"),
        ]));
        // sha1 agrees but sha256 does not: the stronger algorithm wins
        let report = DigestCorrelator::correlate(
            &doc,
            &[statement(IMAGE_URI, &[("sha1", "1111"), ("sha256", "9999"), ("sha512", "ff")])],
        );
        let entry = &report.entries()[0];
        assert_eq!(entry.verdict, Verdict::Mismatch);
        assert_eq!(entry.algorithm, Some(ChecksumAlgorithm::Sha256));
    }

    #[test]
    fn test_no_common_algorithm_is_inconclusive() {
        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(
            &doc,
            &[statement(IMAGE_URI, &[("sha1", "abcd"), ("gitCommit", "abcd")])],
        );
        assert_eq!(report.entries()[0].verdict, Verdict::Inconclusive);
        assert!(report.entries()[0].package_id.is_some());
        assert!(!report.has_mismatch());
    }

    #[test]
    fn test_unmatched_material_and_unclaimed_package() {
        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(
            &doc,
            &[statement("git+https://github.com/kubernetes/kubernetes", &[("sha1", "94db")])],
        );

        assert_eq!(report.count(Verdict::Inconclusive), 1);
        assert_eq!(report.count(Verdict::Unclaimed), 1);
        assert!(report.entries()[0].package_id.is_none());
    }

    #[test]
    fn test_no_statements_marks_sourced_packages_unclaimed() {
        let doc = document(Checksums::new());
        let report = DigestCorrelator::correlate(&doc, &[]);
        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.entries()[0].verdict, Verdict::Unclaimed);
    }

    #[test]
    fn test_uri_normalization() {
        assert_eq!(normalize_uri(" docker://docker.io/library/alpine:3.19/ "), IMAGE_URI);

        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(
            &doc,
            &[statement("docker://docker.io/library/alpine:3.19/", &[("sha256", "abcd")])],
        );
        assert_eq!(report.count(Verdict::Verified), 1);
    }

    #[test]
    fn test_material_matches_purl() {
        let doc = document(checksums(&[(ChecksumAlgorithm::Sha256, "abcd")]));
        let report = DigestCorrelator::correlate(
            &doc,
            &[statement("pkg:oci/alpine@sha256%3Aaa", &[("sha256", "abcd")])],
        );
        assert_eq!(report.count(Verdict::Verified), 1);
    }
}
