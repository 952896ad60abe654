//! Container image inspection: image tarballs and registry pulls
mod image_inspector;
mod image_reference;
mod layer_reader;
mod oci;
mod os_packages;
mod registry_client;
mod tarball_inspector;

pub use image_inspector::ImageInspector;
pub use image_reference::{ImageReference, ReferenceTarget, DEFAULT_REGISTRY};
pub use registry_client::RegistryClient;
pub use tarball_inspector::TarballInspector;
