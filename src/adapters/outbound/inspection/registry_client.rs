use super::image_reference::{ImageReference, ReferenceTarget};
use super::oci::{
    is_index, select_manifest, sha256_hex, Descriptor, DockerArchiveEntry, ImageIndex,
    ImageManifest, Platform, ANNOTATION_IMAGE_NAME, ANNOTATION_REF_NAME, MANIFEST_ACCEPT,
    OCI_INDEX, OCI_MANIFEST,
};
use crate::ports::outbound::InspectionOptions;
use crate::shared::error::SbomError;
use crate::shared::security::MAX_METADATA_SIZE;
use crate::shared::Result;
use anyhow::Context;
use dashmap::DashMap;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const OCI_LAYOUT: &[u8] = br#"{"imageLayoutVersion":"1.0.0"}"#;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// RegistryClient pulls images over the OCI distribution API into archives
///
/// Pulls are anonymous, with bearer tokens obtained from the registry's
/// `WWW-Authenticate` challenge. Tokens are cached per repository and shared
/// by every clone of the client, so concurrent pulls of the same repository
/// authenticate once.
///
/// The client is blocking. Callers on an async runtime must run it on a
/// blocking thread.
#[derive(Clone)]
pub struct RegistryClient {
    tokens: Arc<DashMap<String, String>>,
    max_retries: u32,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(DashMap::new()),
            max_retries: 3,
        }
    }

    /// Pulls `reference` and writes it to `dest_dir` as an image tarball
    ///
    /// The archive holds both an OCI image layout and a docker-archive
    /// `manifest.json`, so it can be loaded by either toolchain and read
    /// back by [`super::TarballInspector`]. Provider options:
    /// `platform` (`os/arch[/variant]`) and `insecure` (`true` for plain HTTP).
    ///
    /// # Errors
    /// Returns [`SbomError::Registry`]. Nothing is left in `dest_dir` on failure.
    pub fn pull(&self, reference: &str, dest_dir: &Path, options: &InspectionOptions) -> Result<PathBuf> {
        self.pull_image(reference, dest_dir, options).map_err(|e| {
            SbomError::Registry {
                reference: reference.to_string(),
                details: format!("{:#}", e),
            }
            .into()
        })
    }

    fn pull_image(&self, reference: &str, dest_dir: &Path, options: &InspectionOptions) -> Result<PathBuf> {
        let reference = ImageReference::parse(reference)?;
        if !dest_dir.is_dir() {
            anyhow::bail!("destination '{}' is not a directory", dest_dir.display());
        }
        let platform = match options.provider_option("platform") {
            Some(value) => Platform::parse(value)?,
            None => Platform::default(),
        };
        let scheme = match options.provider_option("insecure") {
            Some("true") => "http",
            _ => "https",
        };

        let session = Session {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(600))
                .user_agent(format!("spdx-bom/{}", env!("CARGO_PKG_VERSION")))
                .build()?,
            base: format!("{}://{}/v2/{}", scheme, reference.api_host(), reference.repository),
            repository: reference.repository.clone(),
            cache_key: reference.name(),
            tokens: &self.tokens,
            max_retries: self.max_retries,
        };

        let (manifest_bytes, media_type, manifest) = session.resolve_manifest(&reference, &platform)?;

        let staging = tempfile::Builder::new()
            .prefix(".spdx-bom-pull-")
            .tempdir_in(dest_dir)?;
        for descriptor in std::iter::once(&manifest.config).chain(&manifest.layers) {
            session.download_blob(descriptor, staging.path())?;
        }

        write_archive(
            dest_dir,
            &reference,
            &manifest_bytes,
            &media_type,
            &manifest,
            staging.path(),
        )
    }
}

/// One pull's view of a repository on a registry
struct Session<'a> {
    client: Client,
    base: String,
    repository: String,
    cache_key: String,
    tokens: &'a DashMap<String, String>,
    max_retries: u32,
}

impl Session<'_> {
    /// Fetches the image manifest for the requested platform, following an
    /// index if the registry answers with one
    fn resolve_manifest(
        &self,
        reference: &ImageReference,
        platform: &Platform,
    ) -> Result<(Vec<u8>, String, ImageManifest)> {
        let (mut bytes, mut media_type) = self.fetch_manifest(reference.manifest_reference())?;
        if let ReferenceTarget::Digest(digest) = &reference.target {
            verify(sha256_hex(digest)?, &sha256(&bytes), "manifest")?;
        }

        let mut document: serde_json::Value =
            serde_json::from_slice(&bytes).context("manifest is not valid JSON")?;
        if is_index(&document) {
            let index: ImageIndex = serde_json::from_value(document)?;
            let descriptor = select_manifest(&index.manifests, platform)
                .with_context(|| format!("no manifest for platform {}", platform))?;
            let expected = descriptor.digest_hex()?.to_string();

            (bytes, media_type) = self.fetch_manifest(&descriptor.digest)?;
            verify(&expected, &sha256(&bytes), "manifest")?;
            document = serde_json::from_slice(&bytes).context("manifest is not valid JSON")?;
            if is_index(&document) {
                anyhow::bail!("nested image indexes are not supported");
            }
        }

        let manifest: ImageManifest =
            serde_json::from_value(document).context("unsupported manifest format")?;
        if media_type.is_empty() {
            media_type = if manifest.media_type.is_empty() {
                OCI_MANIFEST.to_string()
            } else {
                manifest.media_type.clone()
            };
        }
        Ok((bytes, media_type, manifest))
    }

    fn fetch_manifest(&self, reference: &str) -> Result<(Vec<u8>, String)> {
        let response = self.get(&format!("manifests/{}", reference), Some(&MANIFEST_ACCEPT.join(", ")))?;
        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let bytes = response.bytes()?;
        if bytes.len() as u64 > MAX_METADATA_SIZE {
            anyhow::bail!("manifest exceeds {} bytes", MAX_METADATA_SIZE);
        }
        Ok((bytes.to_vec(), media_type))
    }

    /// Streams a blob into `dir/<hex>`, verifying its digest on the way
    fn download_blob(&self, descriptor: &Descriptor, dir: &Path) -> Result<PathBuf> {
        let hex = descriptor.digest_hex()?;
        let path = dir.join(hex);
        if path.exists() {
            return Ok(path);
        }

        let mut response = self.get(&format!("blobs/{}", descriptor.digest), None)?;
        let mut writer = DigestWriter::new(File::create(&path)?);
        response
            .copy_to(&mut writer)
            .with_context(|| format!("failed to download blob {}", descriptor.digest))?;
        let actual = writer.finish()?;
        verify(hex, &actual, "blob")?;
        Ok(path)
    }

    fn get(&self, path: &str, accept: Option<&str>) -> Result<Response> {
        let url = format!("{}/{}", self.base, path);
        with_retry(self.max_retries, || {
            let response = self.send(&url, accept)?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return check_status(response, &url);
            }

            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .context("registry requires authentication but sent no challenge")?;
            let token = self.fetch_token(&challenge)?;
            self.tokens.insert(self.cache_key.clone(), token);
            check_status(self.send(&url, accept)?, &url)
        })
    }

    fn send(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(token) = self.tokens.get(&self.cache_key) {
            request = request.bearer_auth(token.value());
        }
        Ok(request.send()?)
    }

    fn fetch_token(&self, challenge: &str) -> Result<String> {
        let params = parse_challenge(challenge)
            .with_context(|| format!("unsupported authentication challenge '{}'", challenge))?;
        let realm = params.get("realm").context("challenge has no realm")?;

        let default_scope = format!("repository:{}:pull", self.repository);
        let mut query = vec![format!(
            "scope={}",
            urlencoding::encode(params.get("scope").unwrap_or(&default_scope))
        )];
        if let Some(service) = params.get("service") {
            query.insert(0, format!("service={}", urlencoding::encode(service)));
        }
        let separator = if realm.contains('?') { '&' } else { '?' };
        let url = format!("{}{}{}", realm, separator, query.join("&"));

        let response = check_status(self.client.get(&url).send()?, &url)?;
        let body: TokenResponse = response.json()?;
        body.token
            .or(body.access_token)
            .filter(|token| !token.is_empty())
            .context("token endpoint returned no token")
    }
}

/// Parses `Bearer realm="...",service="...",scope="..."`
fn parse_challenge(challenge: &str) -> Option<BTreeMap<String, String>> {
    let (scheme, rest) = challenge.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut params = BTreeMap::new();
    let mut chars = rest.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => value.extend(chars.next()),
                    c => value.push(c),
                }
            }
        } else {
            value = chars.by_ref().take_while(|c| *c != ',').collect();
        }
        params.insert(key.trim().to_ascii_lowercase(), value);
    }
    Some(params)
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    if !response.status().is_success() {
        anyhow::bail!("registry returned status {} for {}", response.status(), url);
    }
    Ok(response)
}

fn with_retry<T>(max_retries: u32, mut operation: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_retries => return Err(e),
            Err(_) => {
                std::thread::sleep(Duration::from_millis(100 * attempt as u64));
                attempt += 1;
            }
        }
    }
}

fn sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn verify(expected: &str, actual: &str, what: &str) -> Result<()> {
    if expected != actual {
        anyhow::bail!(
            "{} digest mismatch: expected sha256:{}, got sha256:{}",
            what,
            expected,
            actual
        );
    }
    Ok(())
}

/// File writer that hashes everything written through it
struct DigestWriter {
    file: File,
    hasher: Sha256,
}

impl DigestWriter {
    fn new(file: File) -> Self {
        Self {
            file,
            hasher: Sha256::new(),
        }
    }

    fn finish(mut self) -> io::Result<String> {
        self.file.flush()?;
        Ok(hex::encode(self.hasher.finalize()))
    }
}

impl Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.file.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn append_entry<R: io::Read>(
    builder: &mut tar::Builder<NamedTempFile>,
    path: &str,
    size: u64,
    data: R,
) -> Result<()> {
    let mut header = tar::Header::new_ustar();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, path, data)?;
    Ok(())
}

/// Writes a pulled image as a combined OCI layout and docker-archive tarball
///
/// `blob_dir` holds every config and layer blob named by its hex digest.
/// The archive is staged next to its destination and renamed into place.
pub(crate) fn write_archive(
    dest_dir: &Path,
    reference: &ImageReference,
    manifest_bytes: &[u8],
    manifest_media_type: &str,
    manifest: &ImageManifest,
    blob_dir: &Path,
) -> Result<PathBuf> {
    let manifest_hex = sha256(manifest_bytes);
    let mut builder = tar::Builder::new(NamedTempFile::new_in(dest_dir)?);

    append_entry(&mut builder, "oci-layout", OCI_LAYOUT.len() as u64, OCI_LAYOUT)?;
    append_entry(
        &mut builder,
        &format!("blobs/sha256/{}", manifest_hex),
        manifest_bytes.len() as u64,
        manifest_bytes,
    )?;

    let mut written = BTreeSet::new();
    let mut layer_paths = Vec::new();
    for descriptor in std::iter::once(&manifest.config).chain(&manifest.layers) {
        let hex = descriptor.digest_hex()?;
        let member = format!("blobs/sha256/{}", hex);
        if written.insert(hex.to_string()) {
            let file = File::open(blob_dir.join(hex))
                .with_context(|| format!("blob {} was not downloaded", descriptor.digest))?;
            let size = file.metadata()?.len();
            append_entry(&mut builder, &member, size, file)?;
        }
        layer_paths.push(member);
    }
    let config_path = layer_paths.remove(0);

    let mut descriptor = Descriptor::new(manifest_media_type, &manifest_hex, manifest_bytes.len() as u64);
    descriptor
        .annotations
        .insert(ANNOTATION_IMAGE_NAME.to_string(), reference.to_string());
    if let Some(tag) = reference.tag() {
        descriptor
            .annotations
            .insert(ANNOTATION_REF_NAME.to_string(), tag.to_string());
    }
    let index = serde_json::to_vec(&ImageIndex {
        schema_version: 2,
        media_type: OCI_INDEX.to_string(),
        manifests: vec![descriptor],
    })?;
    append_entry(&mut builder, "index.json", index.len() as u64, index.as_slice())?;

    let docker_manifest = serde_json::to_vec(&[DockerArchiveEntry {
        config: config_path,
        repo_tags: reference.tag().map(|_| vec![reference.to_string()]),
        layers: layer_paths,
    }])?;
    append_entry(
        &mut builder,
        "manifest.json",
        docker_manifest.len() as u64,
        docker_manifest.as_slice(),
    )?;

    let staged = builder.into_inner()?;
    let target = dest_dir.join(reference.archive_file_name());
    staged
        .persist(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(target)
}
