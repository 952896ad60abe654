use super::{Checksums, PackagePurpose};

/// SPDX value for fields the generator makes no claim about
pub const NOASSERTION: &str = "NOASSERTION";

/// Fields shared by every identifiable object of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub spdx_id: String,
    pub name: String,
    pub checksums: Checksums,
    pub license_concluded: Option<String>,
    pub license_declared: Option<String>,
    pub copyright_text: Option<String>,
    pub supplier: Option<String>,
}

impl Entity {
    pub fn new(spdx_id: String, name: String, checksums: Checksums) -> Self {
        Self {
            spdx_id,
            name,
            checksums,
            license_concluded: None,
            license_declared: None,
            copyright_text: None,
            supplier: None,
        }
    }

    pub fn license_concluded_or_noassertion(&self) -> &str {
        self.license_concluded.as_deref().unwrap_or(NOASSERTION)
    }

    pub fn license_declared_or_noassertion(&self) -> &str {
        self.license_declared.as_deref().unwrap_or(NOASSERTION)
    }

    pub fn copyright_or_noassertion(&self) -> &str {
        self.copyright_text.as_deref().unwrap_or(NOASSERTION)
    }
}

/// Package entity: an image, a layer or an OS package
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub entity: Entity,
    pub version: Option<String>,
    pub purpose: PackagePurpose,
    pub download_location: Option<String>,
    pub purl: Option<String>,
    /// Whether the package's files were enumerated into the document
    pub files_analyzed: bool,
}

impl Package {
    pub fn spdx_id(&self) -> &str {
        &self.entity.spdx_id
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn download_location_or_noassertion(&self) -> &str {
        self.download_location.as_deref().unwrap_or(NOASSERTION)
    }
}

/// File entity: always a leaf
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub entity: Entity,
    pub size: u64,
}

impl File {
    pub fn spdx_id(&self) -> &str {
        &self.entity.spdx_id
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noassertion_defaults() {
        let entity = Entity::new(
            "SPDXRef-File-sh-0123456789ab".to_string(),
            "bin/sh".to_string(),
            Checksums::new(),
        );
        assert_eq!(entity.license_concluded_or_noassertion(), NOASSERTION);
        assert_eq!(entity.license_declared_or_noassertion(), NOASSERTION);
        assert_eq!(entity.copyright_or_noassertion(), NOASSERTION);
    }

    #[test]
    fn test_package_accessors() {
        let package = Package {
            entity: Entity::new(
                "SPDXRef-Image-alpine-0123456789ab".to_string(),
                "alpine".to_string(),
                Checksums::new(),
            ),
            version: None,
            purpose: PackagePurpose::Container,
            download_location: None,
            purl: None,
            files_analyzed: false,
        };
        assert_eq!(package.spdx_id(), "SPDXRef-Image-alpine-0123456789ab");
        assert_eq!(package.name(), "alpine");
        assert_eq!(package.download_location_or_noassertion(), NOASSERTION);
    }
}
