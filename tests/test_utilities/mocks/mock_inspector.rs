use spdx_bom::prelude::*;
use spdx_bom::shared::error::SbomError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mock ArtifactInspector driven by a script set up before the run
///
/// Unscripted tarballs that exist on disk are read with the real
/// [`TarballInspector`], which keeps pulled archives inspectable.
#[derive(Clone, Default)]
pub struct MockInspector {
    packages: HashMap<PathBuf, ArtifactPackage>,
    failures: HashMap<PathBuf, String>,
    extracted: Option<PathBuf>,
    extract_error: Option<String>,
    archives: HashMap<String, Vec<u8>>,
    pull_failures: HashMap<String, String>,
}

impl MockInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, tarball: &str, package: ArtifactPackage) -> Self {
        self.packages.insert(PathBuf::from(tarball), package);
        self
    }

    pub fn with_failure(mut self, tarball: &str, message: &str) -> Self {
        self.failures.insert(PathBuf::from(tarball), message.to_string());
        self
    }

    /// Path reported by `extract_tarball_tmp`
    pub fn with_extracted(mut self, path: impl Into<PathBuf>) -> Self {
        self.extracted = Some(path.into());
        self
    }

    /// Failure reported by `extract_tarball_tmp`; wins over a scripted path
    pub fn with_extract_error(mut self, message: &str) -> Self {
        self.extract_error = Some(message.to_string());
        self
    }

    /// Archive bytes written by `pull_images_to_archive` for `reference`
    pub fn with_archive(mut self, reference: &str, archive: Vec<u8>) -> Self {
        self.archives.insert(reference.to_string(), archive);
        self
    }

    pub fn with_pull_failure(mut self, reference: &str, message: &str) -> Self {
        self.pull_failures.insert(reference.to_string(), message.to_string());
        self
    }
}

impl ArtifactInspector for MockInspector {
    fn extract_tarball_tmp(&self, tarball: &Path) -> Result<ExtractedTarball> {
        if let Some(details) = &self.extract_error {
            return Err(SbomError::TarballRead {
                path: tarball.to_path_buf(),
                details: details.clone(),
            }
            .into());
        }
        match &self.extracted {
            Some(path) => Ok(ExtractedTarball::at(path.clone())),
            None => anyhow::bail!("mock: no extraction scripted for {}", tarball.display()),
        }
    }

    fn package_from_image_tarball(
        &self,
        tarball: &Path,
        options: &InspectionOptions,
    ) -> Result<ArtifactPackage> {
        if let Some(details) = self.failures.get(tarball) {
            return Err(SbomError::Inspection {
                path: tarball.to_path_buf(),
                details: details.clone(),
            }
            .into());
        }
        if let Some(package) = self.packages.get(tarball) {
            return Ok(package.clone());
        }
        if tarball.is_file() {
            return TarballInspector::new().inspect(tarball, options);
        }
        anyhow::bail!("mock: no package scripted for {}", tarball.display())
    }

    fn pull_images_to_archive(
        &self,
        reference: &str,
        dest_dir: &Path,
        _options: &InspectionOptions,
    ) -> Result<PathBuf> {
        if let Some(details) = self.pull_failures.get(reference) {
            return Err(SbomError::Registry {
                reference: reference.to_string(),
                details: details.clone(),
            }
            .into());
        }
        let archive = self
            .archives
            .get(reference)
            .ok_or_else(|| anyhow::anyhow!("mock: no archive scripted for {}", reference))?;

        let file_name: String = reference
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        let path = dest_dir.join(format!("{}.tar", file_name));
        std::fs::write(&path, archive)?;
        Ok(path)
    }
}
