//! Installed OS package databases (dpkg and apk).

use crate::sbom_generation::domain::{ArtifactPackage, PackagePurpose};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DPKG_STATUS: &str = "var/lib/dpkg/status";
pub const APK_INSTALLED: &str = "lib/apk/db/installed";

/// Reads the `ID` field of an os-release file
pub fn distro_id(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        let value = line.strip_prefix("ID=")?;
        let value = value.trim().trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Detects OS packages in the captured files of a merged image filesystem
pub fn detect(captured: &BTreeMap<String, Vec<u8>>) -> Vec<ArtifactPackage> {
    let distro = ["etc/os-release", "usr/lib/os-release"]
        .iter()
        .find_map(|path| captured.get(*path))
        .and_then(|content| distro_id(&String::from_utf8_lossy(content)));

    let mut packages = Vec::new();
    if let Some(status) = captured.get(DPKG_STATUS) {
        let distro = distro.as_deref().unwrap_or("debian");
        packages.extend(parse_dpkg_status(&String::from_utf8_lossy(status), distro));
    }
    if let Some(installed) = captured.get(APK_INSTALLED) {
        let distro = distro.as_deref().unwrap_or("alpine");
        packages.extend(parse_apk_installed(&String::from_utf8_lossy(installed), distro));
    }
    packages
}

/// One parsed database record before dependency resolution
struct Record {
    package: ArtifactPackage,
    provides: Vec<String>,
    requires: Vec<String>,
}

/// Parses `/var/lib/dpkg/status`; only packages in state `installed` count
pub fn parse_dpkg_status(content: &str, distro: &str) -> Vec<ArtifactPackage> {
    let mut records = Vec::new();

    for paragraph in paragraphs(content) {
        let fields = dpkg_fields(&paragraph);
        let Some(name) = fields.get("Package") else {
            continue;
        };
        if fields
            .get("Status")
            .is_some_and(|status| !status.ends_with(" installed"))
        {
            continue;
        }

        let version = fields.get("Version").cloned();
        let arch = fields.get("Architecture").cloned();
        let mut package = ArtifactPackage::new(name.clone(), PackagePurpose::OperatingSystemPackage);
        package.purl = Some(purl("deb", distro, name, version.as_deref(), arch.as_deref()));
        package.version = version;
        package.supplier = fields.get("Maintainer").map(|m| format!("Person: {}", m));

        let requires = ["Pre-Depends", "Depends"]
            .iter()
            .filter_map(|field| fields.get(*field))
            .flat_map(|value| value.split(','))
            // Alternatives: the first one is what dpkg installs by default
            .filter_map(|dependency| dependency.split('|').next())
            .filter_map(strip_constraint)
            .collect();
        let provides = fields
            .get("Provides")
            .map(|value| value.split(',').filter_map(strip_constraint).collect())
            .unwrap_or_default();

        records.push(Record {
            package,
            provides,
            requires,
        });
    }

    resolve_dependencies(records)
}

/// Parses Alpine's `/lib/apk/db/installed`
pub fn parse_apk_installed(content: &str, distro: &str) -> Vec<ArtifactPackage> {
    let mut records = Vec::new();

    for paragraph in paragraphs(content) {
        let mut fields: HashMap<char, &str> = HashMap::new();
        for line in paragraph.lines() {
            let mut chars = line.chars();
            if let (Some(key), Some(':')) = (chars.next(), chars.next()) {
                if key.is_ascii() {
                    // Only the first occurrence counts; file entries (F:, R:) repeat
                    fields.entry(key).or_insert(&line[2..]);
                }
            }
        }

        let Some(name) = fields.get(&'P').map(|n| n.to_string()) else {
            continue;
        };
        let version = fields.get(&'V').map(|v| v.to_string());
        let arch = fields.get(&'A').copied();

        let mut package = ArtifactPackage::new(name.clone(), PackagePurpose::OperatingSystemPackage);
        package.purl = Some(purl("apk", distro, &name, version.as_deref(), arch));
        package.version = version;
        package.license_declared = fields.get(&'L').map(|l| l.to_string());
        package.supplier = fields.get(&'m').map(|m| format!("Person: {}", m));

        let split = |key: char| -> Vec<String> {
            fields
                .get(&key)
                .map(|value| {
                    value
                        .split_whitespace()
                        .filter(|d| !d.starts_with('!'))
                        .filter_map(strip_constraint)
                        .collect()
                })
                .unwrap_or_default()
        };

        records.push(Record {
            requires: split('D'),
            provides: split('p'),
            package,
        });
    }

    resolve_dependencies(records)
}

/// Maps required names (package names or provided capabilities) onto
/// installed package names
fn resolve_dependencies(records: Vec<Record>) -> Vec<ArtifactPackage> {
    let mut providers: HashMap<String, String> = HashMap::new();
    for record in &records {
        providers
            .entry(record.package.name.clone())
            .or_insert_with(|| record.package.name.clone());
    }
    for record in &records {
        for provided in &record.provides {
            providers
                .entry(provided.clone())
                .or_insert_with(|| record.package.name.clone());
        }
    }

    records
        .into_iter()
        .map(|record| {
            let mut package = record.package;
            let resolved: BTreeSet<String> = record
                .requires
                .iter()
                .filter_map(|name| providers.get(name))
                .filter(|provider| **provider != package.name)
                .cloned()
                .collect();
            package.depends_on = resolved.into_iter().collect();
            package
        })
        .collect()
}

/// Splits a database into blank-line separated records, joining
/// dpkg continuation lines
fn paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn dpkg_fields(paragraph: &str) -> HashMap<String, String> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut current: Option<String> = None;

    for line in paragraph.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation lines only matter for comma-separated relation fields
            if let Some(value) = current.as_ref().and_then(|key| fields.get_mut(key)) {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            current = Some(key.trim().to_string());
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    fields
}

/// `libc6 (>= 2.34)` → `libc6`, `so:libc.musl.so.1=1` → `so:libc.musl.so.1`
fn strip_constraint(dependency: &str) -> Option<String> {
    let name = dependency
        .trim()
        .split(|c: char| c.is_whitespace() || matches!(c, '(' | '<' | '>' | '=' | '~'))
        .next()?
        .trim();
    let name = name.strip_suffix(":any").unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}

fn purl(kind: &str, distro: &str, name: &str, version: Option<&str>, arch: Option<&str>) -> String {
    let mut purl = format!("pkg:{}/{}/{}", kind, distro, urlencoding::encode(name));
    if let Some(version) = version {
        purl.push('@');
        purl.push_str(&urlencoding::encode(version));
    }
    if let Some(arch) = arch {
        purl.push_str("?arch=");
        purl.push_str(&urlencoding::encode(arch));
    }
    purl
}
