use crate::sbom_generation::domain::ArtifactPackage;
use crate::shared::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Options consumed by inspection providers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionOptions {
    /// Register every layer as its own package instead of collapsing the
    /// layers into the image package
    pub analyze_layers: bool,
    /// Provider-specific settings passed through untouched (`platform`, ...)
    pub provider_options: BTreeMap<String, String>,
}

impl InspectionOptions {
    pub fn new(analyze_layers: bool) -> Self {
        Self {
            analyze_layers,
            provider_options: BTreeMap::new(),
        }
    }

    pub fn with_provider_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provider_options.insert(key.into(), value.into());
        self
    }

    pub fn provider_option(&self, key: &str) -> Option<&str> {
        self.provider_options.get(key).map(String::as_str)
    }
}

/// A fully extracted tarball.
///
/// When the directory was created by the provider it is owned by this value
/// and removed when it is dropped.
#[derive(Debug)]
pub struct ExtractedTarball {
    path: PathBuf,
    _guard: Option<TempDir>,
}

impl ExtractedTarball {
    /// Takes ownership of a temporary directory
    pub fn scoped(dir: TempDir) -> Self {
        Self {
            path: dir.path().to_path_buf(),
            _guard: Some(dir),
        }
    }

    /// Refers to a directory whose lifetime is managed elsewhere
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _guard: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// ArtifactInspector port for reading container images and tarballs
///
/// The graph builder only consumes the [`ArtifactPackage`] trees produced
/// here, so any implementation can be swapped in at construction time.
pub trait ArtifactInspector: Send + Sync {
    /// Extracts a tarball into a fresh temporary directory
    ///
    /// The directory is fully populated when this returns `Ok`, and does not
    /// exist anymore when it returns `Err`.
    ///
    /// # Errors
    /// Returns an error if the tarball is unreadable or malformed
    fn extract_tarball_tmp(&self, tarball: &Path) -> Result<ExtractedTarball>;

    /// Reads an image tarball (docker-archive or OCI layout) into a package tree
    ///
    /// # Errors
    /// Returns an error if the tarball is not a valid image layout
    /// (missing manifest, unreadable layer, missing blob)
    fn package_from_image_tarball(
        &self,
        tarball: &Path,
        options: &InspectionOptions,
    ) -> Result<ArtifactPackage>;

    /// Pulls an image from its registry and writes it as a docker-archive
    /// tarball into `dest_dir`
    ///
    /// No partially written archive is left behind on failure.
    ///
    /// # Returns
    /// Path of the written archive
    ///
    /// # Errors
    /// Returns an error on network, authentication or digest failures
    fn pull_images_to_archive(
        &self,
        reference: &str,
        dest_dir: &Path,
        options: &InspectionOptions,
    ) -> Result<PathBuf>;
}
