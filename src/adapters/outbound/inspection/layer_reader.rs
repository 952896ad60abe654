use crate::sbom_generation::domain::{ArtifactFile, ChecksumAlgorithm, Checksums};
use crate::shared::security::MAX_METADATA_SIZE;
use crate::shared::Result;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256, Sha512};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

/// Files whose content is kept for OS package detection
pub const CAPTURED_FILES: &[&str] = &[
    "var/lib/dpkg/status",
    "lib/apk/db/installed",
    "etc/os-release",
    "usr/lib/os-release",
];

const WHITEOUT_PREFIX: &str = ".wh.";
const OPAQUE_MARKER: &str = ".wh..wh..opq";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Everything read out of one layer blob
#[derive(Debug, Default)]
pub struct LayerContents {
    /// Hex SHA-256 of the blob as stored (compressed)
    pub digest: String,
    /// Size of the blob as stored
    pub size: u64,
    /// Regular files, keyed by normalized path
    pub files: BTreeMap<String, ArtifactFile>,
    /// Paths deleted from lower layers
    pub whiteouts: Vec<String>,
    /// Directories whose lower-layer content is hidden
    pub opaque_dirs: Vec<String>,
    /// Content of [`CAPTURED_FILES`] present in this layer
    pub captured: BTreeMap<String, Vec<u8>>,
    /// Hard links to files of lower layers, link path to target path
    pub links: BTreeMap<String, String>,
}

/// Reader wrapper that hashes and counts every byte passing through
struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    bytes: u64,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    fn finish(mut self) -> io::Result<(String, u64)> {
        io::copy(&mut self, &mut io::sink())?;
        Ok((hex::encode(self.hasher.finalize()), self.bytes))
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}

/// Writer computing the file checksums recorded in the document
#[derive(Default)]
struct FileHasher {
    sha256: Sha256,
    sha512: Sha512,
}

impl FileHasher {
    fn checksums(self) -> Checksums {
        let mut checksums = Checksums::new();
        checksums.insert(ChecksumAlgorithm::Sha256, hex::encode(self.sha256.finalize()));
        checksums.insert(ChecksumAlgorithm::Sha512, hex::encode(self.sha512.finalize()));
        checksums
    }
}

impl Write for FileHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sha256.update(buf);
        self.sha512.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Computes SHA-256 and SHA-512 of everything `reader` yields
pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<(Checksums, u64)> {
    let mut hasher = FileHasher::default();
    let size = io::copy(reader, &mut hasher)?;
    Ok((hasher.checksums(), size))
}

/// Reads one layer blob (plain or gzip-compressed tar)
pub fn read_layer(path: &Path) -> Result<LayerContents> {
    let file = File::open(path)?;
    let mut buffered = BufReader::new(file);
    let magic = buffered.fill_buf()?.to_vec();

    if magic.starts_with(&ZSTD_MAGIC) {
        anyhow::bail!("zstd-compressed layers are not supported");
    }

    let mut raw = HashingReader::new(buffered);
    let mut contents = if magic.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(&mut raw);
        let contents = read_entries(&mut decoder)?;
        io::copy(&mut decoder, &mut io::sink())?;
        contents
    } else {
        read_entries(&mut raw)?
    };

    let (digest, size) = raw.finish()?;
    contents.digest = digest;
    contents.size = size;
    Ok(contents)
}

fn read_entries<R: Read>(reader: R) -> Result<LayerContents> {
    let mut contents = LayerContents::default();
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = entry.path()?.to_string_lossy().into_owned();
        let Some(path) = normalize_path(&raw_path) else {
            continue;
        };

        let (parent, base) = match path.rsplit_once('/') {
            Some((parent, base)) => (parent.to_string(), base),
            None => (String::new(), path.as_str()),
        };

        if base == OPAQUE_MARKER {
            contents.opaque_dirs.push(parent);
            continue;
        }
        if let Some(hidden) = base.strip_prefix(WHITEOUT_PREFIX) {
            contents.whiteouts.push(join_path(&parent, hidden));
            continue;
        }

        match entry.header().entry_type() {
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                let capture = CAPTURED_FILES.contains(&path.as_str())
                    && entry.header().size()? <= MAX_METADATA_SIZE;

                let (checksums, size) = if capture {
                    let mut buffer = Vec::new();
                    entry.read_to_end(&mut buffer)?;
                    let hashed = hash_reader(&mut buffer.as_slice())?;
                    contents.captured.insert(path.clone(), buffer);
                    hashed
                } else {
                    hash_reader(&mut entry)?
                };

                contents
                    .files
                    .insert(path.clone(), ArtifactFile::new(path, size, checksums));
            }
            tar::EntryType::Link => {
                // Hard links share the checksums of their target
                let Some(target) = entry
                    .link_name()?
                    .and_then(|name| normalize_path(&name.to_string_lossy()))
                else {
                    continue;
                };
                match contents.files.get(&target).cloned() {
                    Some(linked) => {
                        contents
                            .files
                            .insert(path.clone(), ArtifactFile::new(path, linked.size, linked.checksums));
                    }
                    None => {
                        contents.links.insert(path, target);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(contents)
}

/// Strips `./` and `/` prefixes and trailing slashes; `None` for the root
fn normalize_path(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches("./").trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Union filesystem view of an image, built by applying layers in order
#[derive(Debug, Default)]
pub struct MergedFilesystem {
    pub files: BTreeMap<String, ArtifactFile>,
    pub captured: BTreeMap<String, Vec<u8>>,
}

impl MergedFilesystem {
    /// Applies one layer on top of the current view
    ///
    /// Hard links into lower layers are resolved first and added to the
    /// layer's own files; a link whose target exists nowhere is dropped.
    /// Opaque directories and whiteouts only hide lower layers, so they are
    /// applied before the layer's own files.
    pub fn apply(&mut self, layer: &mut LayerContents) {
        for (path, target) in std::mem::take(&mut layer.links) {
            if let Some(linked) = self.files.get(&target) {
                let file = ArtifactFile::new(path.clone(), linked.size, linked.checksums.clone());
                layer.files.insert(path, file);
            }
        }

        for dir in &layer.opaque_dirs {
            let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };
            self.files.retain(|path, _| !path.starts_with(&prefix));
            self.captured.retain(|path, _| !path.starts_with(&prefix));
        }

        for hidden in &layer.whiteouts {
            let prefix = format!("{}/", hidden);
            let keep = |path: &String| path != hidden && !path.starts_with(&prefix);
            self.files.retain(|path, _| keep(path));
            self.captured.retain(|path, _| keep(path));
        }

        for (path, file) in &layer.files {
            self.files.insert(path.clone(), file.clone());
        }
        for (path, content) in &layer.captured {
            self.captured.insert(path.clone(), content.clone());
        }
    }
}
