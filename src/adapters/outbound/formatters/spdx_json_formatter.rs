use crate::ports::outbound::SpdxFormatter;
use crate::sbom_generation::domain::{
    Checksums, Document, DocumentMetadata, File, Package, Relationship, DOCUMENT_ID,
};
use crate::shared::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument<'a> {
    spdx_version: &'a str,
    data_license: &'a str,
    #[serde(rename = "SPDXID")]
    spdx_id: &'a str,
    name: &'a str,
    document_namespace: &'a str,
    creation_info: CreationInfo<'a>,
    packages: Vec<SpdxPackage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<SpdxFile<'a>>,
    relationships: Vec<SpdxRelationship<'a>>,
}

#[derive(Debug, Serialize)]
struct CreationInfo<'a> {
    created: &'a str,
    creators: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage<'a> {
    #[serde(rename = "SPDXID")]
    spdx_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_info: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supplier: Option<&'a str>,
    download_location: &'a str,
    files_analyzed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checksums: Vec<SpdxChecksum<'a>>,
    license_concluded: &'a str,
    license_declared: &'a str,
    copyright_text: &'a str,
    primary_package_purpose: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<ExternalRef<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxFile<'a> {
    #[serde(rename = "SPDXID")]
    spdx_id: &'a str,
    file_name: String,
    checksums: Vec<SpdxChecksum<'a>>,
    license_concluded: &'a str,
    copyright_text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxChecksum<'a> {
    algorithm: &'static str,
    checksum_value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExternalRef<'a> {
    reference_category: &'static str,
    reference_type: &'static str,
    reference_locator: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship<'a> {
    spdx_element_id: &'a str,
    relationship_type: &'static str,
    related_spdx_element: &'a str,
}

/// SpdxJsonFormatter adapter for generating SPDX 2.3 JSON documents
///
/// Field order and element order are fixed, so the output is byte-identical
/// for identical documents.
pub struct SpdxJsonFormatter;

impl SpdxJsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpdxJsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpdxFormatter for SpdxJsonFormatter {
    fn format(&self, document: &Document) -> Result<String> {
        let metadata: &DocumentMetadata = document.metadata();
        let spdx = SpdxDocument {
            spdx_version: metadata.spdx_version(),
            data_license: metadata.data_license(),
            spdx_id: DOCUMENT_ID,
            name: metadata.name(),
            document_namespace: metadata.namespace(),
            creation_info: CreationInfo {
                created: metadata.created(),
                creators: metadata.creators(),
            },
            packages: document.packages().iter().map(build_package).collect(),
            files: document.files().iter().map(build_file).collect(),
            relationships: document
                .relationships()
                .iter()
                .map(build_relationship)
                .collect(),
        };

        let mut json = serde_json::to_string_pretty(&spdx)?;
        json.push('\n');
        Ok(json)
    }
}

fn build_package(package: &Package) -> SpdxPackage<'_> {
    let entity = &package.entity;
    SpdxPackage {
        spdx_id: package.spdx_id(),
        name: package.name(),
        version_info: package.version.as_deref(),
        supplier: entity.supplier.as_deref(),
        download_location: package.download_location_or_noassertion(),
        files_analyzed: package.files_analyzed,
        checksums: build_checksums(&entity.checksums),
        license_concluded: entity.license_concluded_or_noassertion(),
        license_declared: entity.license_declared_or_noassertion(),
        copyright_text: entity.copyright_or_noassertion(),
        primary_package_purpose: package.purpose.spdx_purpose(),
        external_refs: package
            .purl
            .as_deref()
            .map(|purl| ExternalRef {
                reference_category: "PACKAGE-MANAGER",
                reference_type: "purl",
                reference_locator: purl,
            })
            .into_iter()
            .collect(),
    }
}

fn build_file(file: &File) -> SpdxFile<'_> {
    SpdxFile {
        spdx_id: file.spdx_id(),
        file_name: relative_file_name(file.name()),
        checksums: build_checksums(&file.entity.checksums),
        license_concluded: file.entity.license_concluded_or_noassertion(),
        copyright_text: file.entity.copyright_or_noassertion(),
    }
}

fn build_checksums(checksums: &Checksums) -> Vec<SpdxChecksum<'_>> {
    checksums
        .iter()
        .map(|(algorithm, value)| SpdxChecksum {
            algorithm: algorithm.spdx_name(),
            checksum_value: value,
        })
        .collect()
}

fn build_relationship(relationship: &Relationship) -> SpdxRelationship<'_> {
    SpdxRelationship {
        spdx_element_id: &relationship.from,
        relationship_type: relationship.relationship_type.as_str(),
        related_spdx_element: &relationship.to,
    }
}

/// SPDX file names are relative paths starting with `./`
pub(crate) fn relative_file_name(path: &str) -> String {
    format!("./{}", path.trim_start_matches("./").trim_start_matches('/'))
}
