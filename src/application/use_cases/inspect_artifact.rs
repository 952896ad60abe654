use crate::application::dto::ArtifactSource;
use crate::ports::outbound::{ArtifactInspector, ExtractedTarball, InspectionOptions};
use crate::sbom_generation::domain::ArtifactPackage;
use crate::shared::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// InspectArtifactUseCase - Facade over an injected inspection provider
///
/// Holds the provider together with the options every call passes to it.
/// Errors always name the artifact that triggered them.
///
/// # Type Parameters
/// * `I` - ArtifactInspector implementation
pub struct InspectArtifactUseCase<I> {
    inspector: I,
    options: InspectionOptions,
}

impl<I: ArtifactInspector> InspectArtifactUseCase<I> {
    pub fn new(inspector: I, options: InspectionOptions) -> Self {
        Self { inspector, options }
    }

    pub fn options(&self) -> &InspectionOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut InspectionOptions {
        &mut self.options
    }

    pub fn extract_tarball_tmp(&self, tarball: &Path) -> Result<ExtractedTarball> {
        self.inspector
            .extract_tarball_tmp(tarball)
            .with_context(|| format!("while extracting '{}'", tarball.display()))
    }

    pub fn package_from_image_tarball(&self, tarball: &Path) -> Result<ArtifactPackage> {
        self.inspector
            .package_from_image_tarball(tarball, &self.options)
            .with_context(|| format!("while inspecting '{}'", tarball.display()))
    }

    pub fn pull_images_to_archive(&self, reference: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.inspector
            .pull_images_to_archive(reference, dest_dir, &self.options)
            .with_context(|| format!("while pulling '{}'", reference))
    }

    /// Produces the package tree of one artifact
    ///
    /// Images are pulled into a temporary directory that is removed before
    /// this returns, whatever the outcome.
    pub fn inspect(&self, source: &ArtifactSource) -> Result<ArtifactPackage> {
        match source {
            ArtifactSource::Tarball(path) => self.package_from_image_tarball(path),
            ArtifactSource::Image(reference) => {
                let workdir = tempfile::Builder::new()
                    .prefix("spdx-bom-pull-")
                    .tempdir()
                    .with_context(|| format!("while pulling '{}'", reference))?;
                let archive = self.pull_images_to_archive(reference, workdir.path())?;
                self.package_from_image_tarball(&archive)
                    .with_context(|| format!("while inspecting pulled image '{}'", reference))
            }
        }
    }
}
