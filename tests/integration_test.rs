/// Integration tests for the application layer
mod test_utilities;

use chrono::{TimeZone, Utc};
use spdx_bom::prelude::*;
use spdx_bom::shared::error::SbomError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use test_utilities::images::{self, DOCKER_CONFIG};
use test_utilities::mocks::*;

const K8S_PROVENANCE: &str = "tests/fixtures/provenance/k8s-1.23.0-alpha.4-provenance.json";

fn fixed_request(artifacts: Vec<ArtifactSource>) -> GenerateDocumentRequest {
    let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    GenerateDocumentRequest::new(artifacts, created)
}

fn tarballs(paths: &[&Path]) -> Vec<ArtifactSource> {
    paths
        .iter()
        .map(|p| ArtifactSource::Tarball(p.to_path_buf()))
        .collect()
}

// ============================================================================
// Provenance statements
// ============================================================================

#[test]
fn test_k8s_provenance_fixture() {
    let statement = FileSystemReader::new()
        .load_statement(Path::new(K8S_PROVENANCE))
        .unwrap();

    assert_eq!(statement.subjects().len(), 461);
    assert_eq!(statement.builder_id(), "pkg:github/puerco/release@provenance");

    let material = &statement.materials()[0];
    assert_eq!(
        material.digest.get("sha1").map(String::as_str),
        Some("94db9bed6b7c56420e722d1b15db4610c9cacd3f")
    );
    assert_eq!(material.uri, "git+https://github.com/kubernetes/kubernetes");
}

#[test]
fn test_statement_survives_reserialization() {
    let loaded = FileSystemReader::new()
        .load_statement(Path::new(K8S_PROVENANCE))
        .unwrap();

    let reparsed = Statement::from_json(&loaded.to_json().unwrap()).unwrap();
    assert_eq!(loaded, reparsed);
    // Fields outside the modelled schema are carried along
    assert!(reparsed.predicate.extra.contains_key("recipe"));
}

#[test]
fn test_statement_without_subjects_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.intoto.json");
    std::fs::write(&path, r#"{"subject":[],"predicate":{"builder":{"id":"ci"}}}"#).unwrap();

    let err = FileSystemReader::new().load_statement(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SbomError>(),
        Some(SbomError::StatementValidation { .. })
    ));
}

// ============================================================================
// Inspection provider scenarios
// ============================================================================

#[test]
fn test_package_from_image_tarball_populates_name() {
    let dir = TempDir::new().unwrap();
    let tarball = images::write_docker_archive(dir.path(), "debian.tar", Some("debian:12"));

    let inspect = InspectArtifactUseCase::new(ImageInspector::new(), InspectionOptions::new(false));
    let package = inspect.package_from_image_tarball(&tarball).unwrap();

    assert_eq!(package.name, "debian:12");
    assert_eq!(package.purpose, PackagePurpose::Container);
    let os_packages: Vec<&str> = package.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(os_packages, vec!["libc6", "bash"]);
}

#[test]
fn test_package_from_image_tarball_provider_failure() {
    let inspector = MockInspector::new().with_failure("broken.tar", "unreadable layer");
    let inspect = InspectArtifactUseCase::new(inspector, InspectionOptions::new(false));

    let result = inspect.package_from_image_tarball(Path::new("broken.tar"));
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("unreadable layer"));
    assert!(format!("{:#}", err).contains("broken.tar"));
}

#[test]
fn test_extract_tarball_tmp_returns_populated_directory() {
    let dir = TempDir::new().unwrap();
    let tarball = images::write_docker_archive(dir.path(), "debian.tar", None);

    let inspect = InspectArtifactUseCase::new(ImageInspector::new(), InspectionOptions::default());
    let extracted = inspect.extract_tarball_tmp(&tarball).unwrap();

    assert!(!extracted.path().as_os_str().is_empty());
    assert!(extracted.path().join("manifest.json").is_file());
}

#[test]
fn test_extract_tarball_tmp_error_wins_over_path() {
    let inspector = MockInspector::new()
        .with_extracted("/tmp/spdx-bom-scripted")
        .with_extract_error("truncated archive");
    let inspect = InspectArtifactUseCase::new(inspector, InspectionOptions::default());

    let err = inspect
        .extract_tarball_tmp(Path::new("image.tar"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SbomError>(),
        Some(SbomError::TarballRead { .. })
    ));
}

#[test]
fn test_pulling_twice_correlates_identically() {
    let reference = "docker.io/library/debian:12";
    let (archive, manifest_hex) = images::oci_archive(reference, &images::debian_layers());
    let inspector = MockInspector::new().with_archive(reference, archive);
    let statement = Statement::from_json(&images::statement_json(
        &format!("docker://{}", reference),
        "sha256",
        &manifest_hex,
    ))
    .unwrap();

    let inspect = InspectArtifactUseCase::new(inspector, InspectionOptions::new(false));
    let correlate_once = || {
        let package = inspect
            .inspect(&ArtifactSource::Image(reference.to_string()))
            .unwrap();
        let metadata = MetadataGenerator::generate_metadata(
            "debian",
            None,
            &[reference.to_string()],
            &[],
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        let mut builder = GraphBuilder::new(metadata);
        builder.add_artifact(package).unwrap();
        DigestCorrelator::correlate(&builder.finish().unwrap(), std::slice::from_ref(&statement))
    };

    let first = correlate_once();
    let second = correlate_once();

    assert_eq!(first, second);
    assert_eq!(first.count(Verdict::Verified), 1);
    assert!(!first.has_mismatch());
}

#[test]
fn test_pull_failure_names_the_reference() {
    let inspector = MockInspector::new().with_pull_failure("ghcr.io/acme/app:1.0", "401 Unauthorized");
    let inspect = InspectArtifactUseCase::new(inspector, InspectionOptions::default());
    let dest = TempDir::new().unwrap();

    let err = inspect
        .pull_images_to_archive("ghcr.io/acme/app:1.0", dest.path())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<SbomError>(), Some(SbomError::Registry { .. })));
    assert!(std::fs::read_dir(dest.path()).unwrap().next().is_none());
}

// ============================================================================
// Document generation
// ============================================================================

#[tokio::test]
async fn test_generate_document_from_tarballs() {
    let dir = TempDir::new().unwrap();
    let first = images::write_docker_archive(dir.path(), "debian.tar", Some("debian:12"));
    let second = images::write_docker_archive(dir.path(), "app.tar", Some("registry.example.com/acme/app:2.1"));

    let reporter = MockProgressReporter::new();
    let use_case = GenerateDocumentUseCase::new(ImageInspector::new(), MockStatementReader::new(), reporter.clone());
    let response = use_case
        .execute(fixed_request(tarballs(&[&first, &second])))
        .await
        .unwrap();

    let described: Vec<&str> = response
        .document
        .described_packages()
        .iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(described, vec!["debian:12", "registry.example.com/acme/app:2.1"]);
    assert!(!response.has_failures());
    assert!(reporter
        .get_messages()
        .iter()
        .any(|m| m.starts_with("Completed: ")));
}

#[tokio::test]
async fn test_identical_input_serializes_identically() {
    let dir = TempDir::new().unwrap();
    let tarball = images::write_docker_archive(dir.path(), "debian.tar", Some("debian:12"));

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let use_case = GenerateDocumentUseCase::new(
            ImageInspector::new(),
            MockStatementReader::new(),
            MockProgressReporter::new(),
        );
        let mut request = fixed_request(tarballs(&[&tarball]));
        request.options.analyze_layers = true;
        let response = use_case.execute(request).await.unwrap();
        outputs.push((
            SpdxJsonFormatter::new().format(&response.document).unwrap(),
            TagValueFormatter::new().format(&response.document).unwrap(),
        ));
    }

    assert_eq!(outputs[0].0, outputs[1].0);
    assert_eq!(outputs[0].1, outputs[1].1);
}

#[tokio::test]
async fn test_failed_artifact_does_not_abort_run() {
    let dir = TempDir::new().unwrap();
    let good = images::write_docker_archive(dir.path(), "debian.tar", Some("debian:12"));
    let inspector = MockInspector::new().with_failure("missing-layer.tar", "missing blob sha256:abc");

    let reporter = MockProgressReporter::new();
    let use_case = GenerateDocumentUseCase::new(inspector, MockStatementReader::new(), reporter.clone());
    let request = fixed_request(vec![
        ArtifactSource::Tarball(PathBuf::from("missing-layer.tar")),
        ArtifactSource::Tarball(good),
    ]);
    let response = use_case.execute(request).await.unwrap();

    assert_eq!(response.document.described_packages().len(), 1);
    assert_eq!(response.failures().count(), 1);
    assert!(response.outcomes[0].is_failed());
    assert!(!response.outcomes[1].is_failed());
    assert_eq!(reporter.errors().len(), 1);
    assert!(reporter.errors()[0].contains("missing-layer.tar"));
}

#[tokio::test]
async fn test_tampered_statement_is_a_mismatch() {
    let dir = TempDir::new().unwrap();
    let (tarball, genuine) = images::write_oci_archive(dir.path(), "debian.tar", "docker.io/library/debian:12");

    let tampered = format!("{}{}", if genuine.starts_with('0') { "1" } else { "0" }, &genuine[1..]);
    let reader = MockStatementReader::new()
        .with_statement("genuine.json", images::statement_json("docker.io/library/debian:12", "sha256", &genuine))
        .with_statement("tampered.json", images::statement_json("docker.io/library/debian:12", "sha256", &tampered));

    let use_case = GenerateDocumentUseCase::new(ImageInspector::new(), reader, MockProgressReporter::new());

    let mut request = fixed_request(tarballs(&[&tarball]));
    request.provenance = vec![PathBuf::from("genuine.json")];
    let verified = use_case.execute(request.clone()).await.unwrap();
    assert!(verified.is_verified());
    assert_eq!(verified.correlation.count(Verdict::Verified), 1);

    request.provenance = vec![PathBuf::from("tampered.json")];
    let mismatched = use_case.execute(request).await.unwrap();
    assert!(!mismatched.is_verified());
    assert_eq!(mismatched.correlation.count(Verdict::Mismatch), 1);
    assert_eq!(mismatched.correlation.count(Verdict::Inconclusive), 0);
}

#[tokio::test]
async fn test_docker_archive_is_inconclusive_against_manifest_digest() {
    let dir = TempDir::new().unwrap();
    let tarball = images::write_docker_archive(dir.path(), "debian.tar", Some("debian:12"));
    let (_, manifest_hex) = images::oci_archive("debian:12", &images::debian_layers());

    // A docker archive carries the config digest, never the manifest digest
    let reader = MockStatementReader::new().with_statement(
        "registry.json",
        images::statement_json("docker.io/library/debian:12", "sha256", &manifest_hex),
    );
    let use_case = GenerateDocumentUseCase::new(ImageInspector::new(), reader, MockProgressReporter::new());

    let mut request = fixed_request(tarballs(&[&tarball]));
    request.provenance = vec![PathBuf::from("registry.json")];
    let response = use_case.execute(request).await.unwrap();

    assert_eq!(response.correlation.count(Verdict::Mismatch), 0);
    assert_eq!(response.correlation.count(Verdict::Inconclusive), 1);
    assert!(response.is_verified());

    let config_digest = images::sha256(DOCKER_CONFIG);
    let image = &response.document.described_packages()[0];
    assert!(image
        .entity
        .checksums
        .values()
        .all(|value| value != &config_digest));
}

#[tokio::test]
async fn test_missing_statement_fails_the_run() {
    let use_case = GenerateDocumentUseCase::new(
        MockInspector::new(),
        MockStatementReader::new(),
        MockProgressReporter::new(),
    );
    let mut request = fixed_request(vec![ArtifactSource::Image("alpine:3.19".to_string())]);
    request.provenance = vec![PathBuf::from("absent.json")];

    assert!(use_case.execute(request).await.is_err());
}
