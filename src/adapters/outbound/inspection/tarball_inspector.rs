use super::image_reference::ImageReference;
use super::layer_reader::{read_layer, LayerContents, MergedFilesystem};
use super::oci::{
    is_index, select_manifest, sha256_hex, Descriptor, DockerArchiveEntry, ImageConfig,
    ImageIndex, ImageManifest, Platform, ANNOTATION_IMAGE_NAME, ANNOTATION_REF_NAME,
};
use super::os_packages;
use crate::ports::outbound::{ExtractedTarball, InspectionOptions};
use crate::sbom_generation::domain::{ArtifactPackage, ChecksumAlgorithm, Checksums, PackagePurpose};
use crate::shared::error::SbomError;
use crate::shared::security::{
    read_checked_file, validate_archive_member, validate_regular_file, MAX_METADATA_SIZE,
};
use crate::shared::Result;
use anyhow::Context;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Nested indexes followed before giving up
const MAX_INDEX_DEPTH: usize = 3;

/// A blob referenced by a manifest, resolved inside the extraction root
struct Blob {
    path: PathBuf,
    /// Hex SHA-256 the content must have, when the layout is content-addressed
    expected: Option<String>,
}

/// Where the pieces of one image live inside an extracted tarball
struct ImageLayout {
    name: Option<String>,
    manifest_digest: Option<String>,
    config: Blob,
    layers: Vec<Blob>,
}

/// TarballInspector reads docker-archive and OCI layout image tarballs
///
/// The tarball is extracted into a scoped temporary directory and every
/// layer is streamed from there, so layers are never unpacked to disk.
#[derive(Debug, Clone, Default)]
pub struct TarballInspector;

impl TarballInspector {
    pub fn new() -> Self {
        Self
    }

    /// Extracts `tarball` (plain or gzip) into a new temporary directory
    ///
    /// # Errors
    /// Returns [`SbomError::TarballRead`] for unreadable or malformed
    /// archives, including members that would escape the directory. The
    /// directory is removed before the error is returned.
    pub fn extract(&self, tarball: &Path) -> Result<ExtractedTarball> {
        let read_error = |details: String| SbomError::TarballRead {
            path: tarball.to_path_buf(),
            details,
        };
        validate_regular_file(tarball, "Tarball").map_err(|e| read_error(format!("{:#}", e)))?;

        let dir = tempfile::Builder::new()
            .prefix("spdx-bom-")
            .tempdir()
            .map_err(|e| read_error(e.to_string()))?;

        unpack(tarball, dir.path()).map_err(|e| read_error(format!("{:#}", e)))?;
        Ok(ExtractedTarball::scoped(dir))
    }

    /// Reads an image tarball into a package tree
    ///
    /// # Errors
    /// Returns [`SbomError::TarballRead`] if the tarball cannot be extracted
    /// and [`SbomError::Inspection`] if it is not a valid image layout
    pub fn inspect(&self, tarball: &Path, options: &InspectionOptions) -> Result<ArtifactPackage> {
        let extracted = self.extract(tarball)?;
        let fallback_name = tarball
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        read_image(extracted.path(), &fallback_name, options).map_err(|e| {
            SbomError::Inspection {
                path: tarball.to_path_buf(),
                details: format!("{:#}", e),
            }
            .into()
        })
    }
}

fn unpack(tarball: &Path, dest: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(tarball)?);
    let is_gzip = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    if is_gzip {
        unpack_entries(GzDecoder::new(reader), dest)
    } else {
        unpack_entries(reader, dest)
    }
}

fn unpack_entries<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);

    let mut count = 0usize;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        validate_archive_member(&name)?;
        entry
            .unpack_in(dest)
            .with_context(|| format!("failed to extract '{}'", name))?;
        count += 1;
    }

    if count == 0 {
        anyhow::bail!("archive contains no entries");
    }
    Ok(())
}

/// Reads the image found in an extracted tarball
pub(crate) fn read_image(
    root: &Path,
    fallback_name: &str,
    options: &InspectionOptions,
) -> Result<ArtifactPackage> {
    let platform = match options.provider_option("platform") {
        Some(value) => Platform::parse(value)?,
        None => Platform::default(),
    };

    let layout = if root.join("index.json").is_file() {
        oci_layout(root, &platform)?
    } else if root.join("manifest.json").is_file() {
        docker_layout(root)?
    } else {
        anyhow::bail!("no manifest.json or index.json found; not an image tarball");
    };

    build_package(layout, fallback_name, options)
}

fn oci_layout(root: &Path, platform: &Platform) -> Result<ImageLayout> {
    let index: ImageIndex = read_json(&root.join("index.json"), "index.json")?;
    let mut descriptor = select_manifest(&index.manifests, platform)
        .with_context(|| format!("index.json has no manifest for platform {}", platform))?
        .clone();

    let name = descriptor
        .annotations
        .get(ANNOTATION_IMAGE_NAME)
        .cloned()
        .or_else(|| docker_repo_tag(root))
        .or_else(|| descriptor.annotations.get(ANNOTATION_REF_NAME).cloned());

    for _ in 0..MAX_INDEX_DEPTH {
        let bytes = read_blob(root, &descriptor)?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("manifest {} is not valid JSON", descriptor.digest))?;

        if is_index(&document) {
            let nested: ImageIndex = serde_json::from_value(document)?;
            descriptor = select_manifest(&nested.manifests, platform)
                .with_context(|| format!("no manifest for platform {} in {}", platform, descriptor.digest))?
                .clone();
            continue;
        }

        let manifest: ImageManifest = serde_json::from_value(document)
            .with_context(|| format!("manifest {} is malformed", descriptor.digest))?;
        return Ok(ImageLayout {
            name,
            manifest_digest: Some(descriptor.digest_hex()?.to_string()),
            config: descriptor_blob(root, &manifest.config)?,
            layers: manifest
                .layers
                .iter()
                .map(|layer| descriptor_blob(root, layer))
                .collect::<Result<_>>()?,
        });
    }

    anyhow::bail!("image index nesting exceeds {} levels", MAX_INDEX_DEPTH)
}

fn docker_layout(root: &Path) -> Result<ImageLayout> {
    let entries: Vec<DockerArchiveEntry> = read_json(&root.join("manifest.json"), "manifest.json")?;
    let entry = entries
        .into_iter()
        .next()
        .context("manifest.json lists no images")?;

    Ok(ImageLayout {
        name: entry.repo_tags.and_then(|tags| tags.into_iter().next()),
        manifest_digest: None,
        config: member_blob(root, &entry.config)?,
        layers: entry
            .layers
            .iter()
            .map(|layer| member_blob(root, layer))
            .collect::<Result<_>>()?,
    })
}

fn docker_repo_tag(root: &Path) -> Option<String> {
    let path = root.join("manifest.json");
    if !path.is_file() {
        return None;
    }
    let entries: Vec<DockerArchiveEntry> = read_json(&path, "manifest.json").ok()?;
    entries.into_iter().next()?.repo_tags?.into_iter().next()
}

fn build_package(
    layout: ImageLayout,
    fallback_name: &str,
    options: &InspectionOptions,
) -> Result<ArtifactPackage> {
    let config_text = read_checked_file(&layout.config.path, "Image config", MAX_METADATA_SIZE)?;
    let config_hex = hex::encode(Sha256::digest(config_text.as_bytes()));
    verify_digest("config", layout.config.expected.as_deref(), &config_hex)?;
    let config: ImageConfig =
        serde_json::from_str(&config_text).context("image config is not valid JSON")?;

    let mut merged = MergedFilesystem::default();
    let mut layer_packages = Vec::new();
    for (index, blob) in layout.layers.iter().enumerate() {
        let mut contents = read_layer(&blob.path)
            .with_context(|| format!("unreadable layer {} ({})", index, blob.path.display()))?;
        verify_digest("layer", blob.expected.as_deref(), &contents.digest)?;
        merged.apply(&mut contents);
        if options.analyze_layers {
            layer_packages.push(layer_package(contents));
        }
    }

    let os_packages = os_packages::detect(&merged.captured);
    // Provenance records the manifest digest. A docker archive only knows the
    // config digest, which must never be published as the image's SHA256.
    let manifest_hex = layout.manifest_digest;
    let reference = layout
        .name
        .as_deref()
        .and_then(|name| ImageReference::parse(name).ok());

    let mut image = ArtifactPackage::new(
        layout.name.clone().unwrap_or_else(|| fallback_name.to_string()),
        PackagePurpose::Container,
    )
    .with_purl(image_purl(
        reference.as_ref(),
        fallback_name,
        manifest_hex.as_deref(),
        config.architecture.as_deref(),
    ));
    if let Some(hex) = &manifest_hex {
        image.checksums = sha256_checksums(hex);
    }

    if let Some(reference) = &reference {
        image.download_location = Some(reference.to_string());
        image.version = reference.tag().map(str::to_string);
    }

    if options.analyze_layers {
        image.packages = layer_packages;
    } else {
        image.files = merged.files.into_values().collect();
    }
    image.packages.extend(os_packages);

    Ok(image)
}

fn layer_package(contents: LayerContents) -> ArtifactPackage {
    let mut layer = ArtifactPackage::new(format!("sha256:{}", contents.digest), PackagePurpose::Layer)
        .with_checksums(sha256_checksums(&contents.digest));
    layer.files = contents.files.into_values().collect();
    layer
}

/// `pkg:oci/<name>@sha256%3A<hex>` with sorted qualifiers; the version is
/// left out when the manifest digest is unknown
fn image_purl(
    reference: Option<&ImageReference>,
    fallback_name: &str,
    digest_hex: Option<&str>,
    architecture: Option<&str>,
) -> String {
    let name = match reference {
        Some(reference) => reference
            .repository
            .rsplit('/')
            .next()
            .unwrap_or(&reference.repository)
            .to_string(),
        None => fallback_name.to_ascii_lowercase(),
    };

    let mut qualifiers = Vec::new();
    if let Some(architecture) = architecture {
        qualifiers.push(format!("arch={}", urlencoding::encode(architecture)));
    }
    if let Some(reference) = reference {
        qualifiers.push(format!("repository_url={}", urlencoding::encode(&reference.name())));
        if let Some(tag) = reference.tag() {
            qualifiers.push(format!("tag={}", urlencoding::encode(tag)));
        }
    }

    let mut purl = format!("pkg:oci/{}", urlencoding::encode(&name));
    if let Some(digest_hex) = digest_hex {
        purl.push('@');
        purl.push_str(&urlencoding::encode(&format!("sha256:{}", digest_hex)));
    }
    if !qualifiers.is_empty() {
        purl.push('?');
        purl.push_str(&qualifiers.join("&"));
    }
    purl
}

fn sha256_checksums(hex: &str) -> Checksums {
    let mut checksums = Checksums::new();
    checksums.insert(ChecksumAlgorithm::Sha256, hex.to_string());
    checksums
}

fn verify_digest(what: &str, expected: Option<&str>, actual: &str) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => anyhow::bail!(
            "{} digest mismatch: expected sha256:{}, got sha256:{}",
            what,
            expected,
            actual
        ),
        _ => Ok(()),
    }
}

/// Resolves an archive member inside `root`, following links only if they
/// stay inside it
fn resolve_member(root: &Path, name: &str) -> Result<PathBuf> {
    validate_archive_member(name)?;
    let canonical_root = root.canonicalize()?;
    let resolved = root
        .join(name)
        .canonicalize()
        .with_context(|| format!("missing blob '{}'", name))?;
    if !resolved.starts_with(&canonical_root) {
        anyhow::bail!("Security: archive member '{}' links outside the archive", name);
    }
    Ok(resolved)
}

fn member_blob(root: &Path, name: &str) -> Result<Blob> {
    Ok(Blob {
        path: resolve_member(root, name)?,
        expected: content_address(name),
    })
}

fn descriptor_blob(root: &Path, descriptor: &Descriptor) -> Result<Blob> {
    let hex = descriptor.digest_hex()?;
    Ok(Blob {
        path: resolve_member(root, &format!("blobs/sha256/{}", hex))?,
        expected: Some(hex.to_string()),
    })
}

/// Digest encoded in a content-addressed member name
/// (`blobs/sha256/<hex>` or `<hex>.json`)
fn content_address(name: &str) -> Option<String> {
    let file_name = name.rsplit('/').next()?;
    let candidate = file_name.strip_suffix(".json").unwrap_or(file_name);
    sha256_hex(&format!("sha256:{}", candidate))
        .ok()
        .map(str::to_string)
}

/// Reads a blob and checks it against its descriptor's digest
fn read_blob(root: &Path, descriptor: &Descriptor) -> Result<Vec<u8>> {
    let blob = descriptor_blob(root, descriptor)?;
    let text = read_checked_file(&blob.path, "Manifest", MAX_METADATA_SIZE)?;
    let actual = hex::encode(Sha256::digest(text.as_bytes()));
    verify_digest("manifest", blob.expected.as_deref(), &actual)?;
    Ok(text.into_bytes())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = read_checked_file(path, what, MAX_METADATA_SIZE)?;
    serde_json::from_str(&text).with_context(|| format!("{} is malformed", what))
}
