use super::Checksums;
use serde::{Deserialize, Serialize};

/// What a package stands for in the image hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackagePurpose {
    /// A container image
    Container,
    /// One filesystem layer of an image
    Layer,
    /// A package installed by the image's OS package manager
    OperatingSystemPackage,
    /// A plain archive that is not an image
    Archive,
}

impl PackagePurpose {
    /// Word used inside SPDX IDs (`SPDXRef-Image-...`)
    pub fn id_kind(self) -> &'static str {
        match self {
            PackagePurpose::Container => "Image",
            PackagePurpose::Layer => "Layer",
            PackagePurpose::OperatingSystemPackage => "Package",
            PackagePurpose::Archive => "Archive",
        }
    }

    /// Value of the SPDX `primaryPackagePurpose` field
    pub fn spdx_purpose(self) -> &'static str {
        match self {
            PackagePurpose::Container => "CONTAINER",
            PackagePurpose::Layer => "ARCHIVE",
            PackagePurpose::OperatingSystemPackage => "LIBRARY",
            PackagePurpose::Archive => "ARCHIVE",
        }
    }
}

/// A file discovered by an inspection provider. Always a leaf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// Path inside the parent package (layer-relative, no leading slash)
    pub path: String,
    pub size: u64,
    pub checksums: Checksums,
}

impl ArtifactFile {
    pub fn new(path: impl Into<String>, size: u64, checksums: Checksums) -> Self {
        Self {
            path: path.into(),
            size,
            checksums,
        }
    }
}

/// A package tree as reported by an inspection provider.
///
/// Children are owned here only while the tree travels from the provider to
/// the graph builder; inside a document they are linked by relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPackage {
    pub name: String,
    pub version: Option<String>,
    pub purpose: PackagePurpose,
    pub checksums: Checksums,
    /// Where the artifact was obtained from (image reference, registry URL)
    pub download_location: Option<String>,
    pub purl: Option<String>,
    pub supplier: Option<String>,
    pub license_declared: Option<String>,
    pub copyright_text: Option<String>,
    pub files: Vec<ArtifactFile>,
    pub packages: Vec<ArtifactPackage>,
    /// Names of sibling packages this package depends on
    pub depends_on: Vec<String>,
}

impl ArtifactPackage {
    pub fn new(name: impl Into<String>, purpose: PackagePurpose) -> Self {
        Self {
            name: name.into(),
            version: None,
            purpose,
            checksums: Checksums::new(),
            download_location: None,
            purl: None,
            supplier: None,
            license_declared: None,
            copyright_text: None,
            files: Vec::new(),
            packages: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_checksums(mut self, checksums: Checksums) -> Self {
        self.checksums = checksums;
        self
    }

    pub fn with_download_location(mut self, location: impl Into<String>) -> Self {
        self.download_location = Some(location.into());
        self
    }

    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = Some(purl.into());
        self
    }

    pub fn with_file(mut self, file: ArtifactFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_package(mut self, package: ArtifactPackage) -> Self {
        self.packages.push(package);
        self
    }

    /// Total number of packages and files in this tree, including itself
    pub fn entity_count(&self) -> usize {
        1 + self.files.len()
            + self
                .packages
                .iter()
                .map(ArtifactPackage::entity_count)
                .sum::<usize>()
    }
}
