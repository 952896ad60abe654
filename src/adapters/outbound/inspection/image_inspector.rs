use super::{RegistryClient, TarballInspector};
use crate::ports::outbound::{ArtifactInspector, ExtractedTarball, InspectionOptions};
use crate::sbom_generation::domain::ArtifactPackage;
use crate::shared::Result;
use std::path::{Path, PathBuf};

/// ImageInspector is the production inspection provider
///
/// Tarballs are read by [`TarballInspector`] and images are pulled by
/// [`RegistryClient`]. Clones share the registry token cache.
#[derive(Clone, Default)]
pub struct ImageInspector {
    tarballs: TarballInspector,
    registry: RegistryClient,
}

impl ImageInspector {
    pub fn new() -> Self {
        Self {
            tarballs: TarballInspector::new(),
            registry: RegistryClient::new(),
        }
    }
}

impl ArtifactInspector for ImageInspector {
    fn extract_tarball_tmp(&self, tarball: &Path) -> Result<ExtractedTarball> {
        self.tarballs.extract(tarball)
    }

    fn package_from_image_tarball(
        &self,
        tarball: &Path,
        options: &InspectionOptions,
    ) -> Result<ArtifactPackage> {
        self.tarballs.inspect(tarball, options)
    }

    fn pull_images_to_archive(
        &self,
        reference: &str,
        dest_dir: &Path,
        options: &InspectionOptions,
    ) -> Result<PathBuf> {
        self.registry.pull(reference, dest_dir, options)
    }
}
