use super::spdx_json_formatter::relative_file_name;
use crate::ports::outbound::SpdxFormatter;
use crate::sbom_generation::domain::{Checksums, Document, File, Package, DOCUMENT_ID};
use crate::shared::Result;

/// SPDX tag-value section separator for packages
const PACKAGE_HEADER: &str = "##### Package: ";

/// TagValueFormatter adapter for generating SPDX 2.3 tag-value documents
pub struct TagValueFormatter;

impl TagValueFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Wraps multi-line values in `<text>` as tag-value requires
    fn text_value(value: &str) -> String {
        if value.contains('\n') {
            format!("<text>{}</text>", value)
        } else {
            value.to_string()
        }
    }

    fn push_tag(output: &mut String, tag: &str, value: &str) {
        output.push_str(tag);
        output.push_str(": ");
        output.push_str(&Self::text_value(value));
        output.push('\n');
    }

    fn push_checksums(output: &mut String, tag: &str, checksums: &Checksums) {
        for (algorithm, value) in checksums {
            Self::push_tag(output, tag, &format!("{}: {}", algorithm.spdx_name(), value));
        }
    }

    fn render_header(&self, output: &mut String, document: &Document) {
        let metadata = document.metadata();
        Self::push_tag(output, "SPDXVersion", metadata.spdx_version());
        Self::push_tag(output, "DataLicense", metadata.data_license());
        Self::push_tag(output, "SPDXID", DOCUMENT_ID);
        Self::push_tag(output, "DocumentName", metadata.name());
        Self::push_tag(output, "DocumentNamespace", metadata.namespace());
        for creator in metadata.creators() {
            Self::push_tag(output, "Creator", creator);
        }
        Self::push_tag(output, "Created", metadata.created());
    }

    fn render_package(&self, output: &mut String, package: &Package) {
        let entity = &package.entity;
        output.push('\n');
        output.push_str(PACKAGE_HEADER);
        output.push_str(package.name());
        output.push_str("\n\n");

        Self::push_tag(output, "PackageName", package.name());
        Self::push_tag(output, "SPDXID", package.spdx_id());
        if let Some(version) = &package.version {
            Self::push_tag(output, "PackageVersion", version);
        }
        if let Some(supplier) = &entity.supplier {
            Self::push_tag(output, "PackageSupplier", supplier);
        }
        Self::push_tag(
            output,
            "PackageDownloadLocation",
            package.download_location_or_noassertion(),
        );
        Self::push_tag(
            output,
            "FilesAnalyzed",
            if package.files_analyzed { "true" } else { "false" },
        );
        Self::push_checksums(output, "PackageChecksum", &entity.checksums);
        Self::push_tag(output, "PackageLicenseConcluded", entity.license_concluded_or_noassertion());
        Self::push_tag(output, "PackageLicenseDeclared", entity.license_declared_or_noassertion());
        Self::push_tag(output, "PackageCopyrightText", entity.copyright_or_noassertion());
        Self::push_tag(output, "PrimaryPackagePurpose", package.purpose.spdx_purpose());
        if let Some(purl) = &package.purl {
            Self::push_tag(output, "ExternalRef", &format!("PACKAGE-MANAGER purl {}", purl));
        }
    }

    fn render_file(&self, output: &mut String, file: &File) {
        output.push('\n');
        Self::push_tag(output, "FileName", &relative_file_name(file.name()));
        Self::push_tag(output, "SPDXID", file.spdx_id());
        Self::push_checksums(output, "FileChecksum", &file.entity.checksums);
        Self::push_tag(output, "LicenseConcluded", file.entity.license_concluded_or_noassertion());
        Self::push_tag(output, "FileCopyrightText", file.entity.copyright_or_noassertion());
    }
}

impl Default for TagValueFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpdxFormatter for TagValueFormatter {
    fn format(&self, document: &Document) -> Result<String> {
        let mut output = String::new();
        self.render_header(&mut output, document);

        for package in document.packages() {
            self.render_package(&mut output, package);
        }
        for file in document.files() {
            self.render_file(&mut output, file);
        }

        if !document.relationships().is_empty() {
            output.push('\n');
        }
        for relationship in document.relationships() {
            Self::push_tag(&mut output, "Relationship", &relationship.to_string());
        }

        Ok(output)
    }
}
