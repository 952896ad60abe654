//! Synthetic image tarballs built in memory with the `tar` crate
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Config blob shared by every docker archive built here
pub const DOCKER_CONFIG: &[u8] = br#"{"architecture":"amd64","os":"linux","rootfs":{"type":"layers"}}"#;

pub fn sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn append(builder: &mut tar::Builder<Vec<u8>>, path: &str, data: &[u8]) {
    let mut header = tar::Header::new_ustar();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, path, data).unwrap();
}

/// Uncompressed layer from `(path, content)` pairs
pub fn layer(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in entries {
        append(&mut builder, path, content);
    }
    builder.into_inner().unwrap()
}

/// A Debian-like root filesystem with two dpkg packages
pub fn debian_layers() -> Vec<Vec<u8>> {
    let status: &[u8] = b"Package: libc6\nStatus: install ok installed\nVersion: 2.36-9\nArchitecture: amd64\n\n\
Package: bash\nStatus: install ok installed\nVersion: 5.2.15-2\nArchitecture: amd64\nDepends: libc6 (>= 2.36)\n";
    vec![
        layer(&[
            ("etc/os-release", b"ID=debian\nVERSION_ID=\"12\"\n"),
            ("var/lib/dpkg/status", status),
            ("bin/bash", b"bash"),
        ]),
        layer(&[("srv/app/main", b"\x7fELF")]),
    ]
}

/// Docker archive (`docker save` layout) bytes
pub fn docker_archive(repo_tag: Option<&str>, layers: &[Vec<u8>]) -> Vec<u8> {
    let config_name = format!("{}.json", sha256(DOCKER_CONFIG));

    let mut builder = tar::Builder::new(Vec::new());
    append(&mut builder, &config_name, DOCKER_CONFIG);
    let layer_names: Vec<String> = layers
        .iter()
        .map(|data| {
            let name = format!("{}/layer.tar", sha256(data));
            append(&mut builder, &name, data);
            name
        })
        .collect();

    let manifest = serde_json::json!([{
        "Config": config_name,
        "RepoTags": repo_tag.map(|tag| vec![tag]),
        "Layers": layer_names,
    }]);
    append(&mut builder, "manifest.json", manifest.to_string().as_bytes());
    builder.into_inner().unwrap()
}

/// Writes a docker archive into `dir` and returns its path
pub fn write_docker_archive(dir: &Path, file_name: &str, repo_tag: Option<&str>) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, docker_archive(repo_tag, &debian_layers())).unwrap();
    path
}

/// OCI image layout bytes plus the hex manifest digest
pub fn oci_archive(image_name: &str, layers: &[Vec<u8>]) -> (Vec<u8>, String) {
    let mut builder = tar::Builder::new(Vec::new());
    append(&mut builder, "oci-layout", br#"{"imageLayoutVersion":"1.0.0"}"#);
    append(&mut builder, &format!("blobs/sha256/{}", sha256(DOCKER_CONFIG)), DOCKER_CONFIG);

    let layer_descriptors: Vec<serde_json::Value> = layers
        .iter()
        .map(|data| {
            append(&mut builder, &format!("blobs/sha256/{}", sha256(data)), data);
            serde_json::json!({
                "mediaType": "application/vnd.oci.image.layer.v1.tar",
                "digest": format!("sha256:{}", sha256(data)),
                "size": data.len(),
            })
        })
        .collect();

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": format!("sha256:{}", sha256(DOCKER_CONFIG)),
            "size": DOCKER_CONFIG.len(),
        },
        "layers": layer_descriptors,
    })
    .to_string()
    .into_bytes();
    let manifest_hex = sha256(&manifest);
    append(&mut builder, &format!("blobs/sha256/{}", manifest_hex), &manifest);

    let index = serde_json::json!({
        "schemaVersion": 2,
        "manifests": [{
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "digest": format!("sha256:{}", manifest_hex),
            "size": manifest.len(),
            "annotations": {"io.containerd.image.name": image_name},
        }],
    });
    append(&mut builder, "index.json", index.to_string().as_bytes());
    (builder.into_inner().unwrap(), manifest_hex)
}

/// Writes an OCI layout tarball into `dir`; returns its path and manifest digest
pub fn write_oci_archive(dir: &Path, file_name: &str, image_name: &str) -> (PathBuf, String) {
    let path = dir.join(file_name);
    let (bytes, manifest_hex) = oci_archive(image_name, &debian_layers());
    fs::write(&path, bytes).unwrap();
    (path, manifest_hex)
}

/// In-toto statement claiming `digest` for `uri`
pub fn statement_json(uri: &str, algorithm: &str, digest: &str) -> String {
    serde_json::json!({
        "_type": "https://in-toto.io/Statement/v0.1",
        "predicateType": "https://slsa.dev/provenance/v0.1",
        "subject": [{"name": uri, "digest": {algorithm: digest}}],
        "predicate": {
            "builder": {"id": "https://ci.example.com/builder@v1"},
            "materials": [{"uri": uri, "digest": {algorithm: digest}}],
        },
    })
    .to_string()
}
