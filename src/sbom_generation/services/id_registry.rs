use crate::sbom_generation::domain::{Checksums, DOCUMENT_ID};
use crate::sbom_generation::policies::ChecksumPriority;
use crate::shared::error::SbomError;
use crate::shared::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Upper bound of numbered disambiguators tried for identical entity keys
pub const MAX_DISAMBIGUATORS: usize = 64;

/// Hex characters of the content hash kept in an ID
const SUFFIX_LEN: usize = 12;

/// Characters of the entity name kept in an ID
const MAX_NAME_LEN: usize = 40;

/// What an entity is made of, for ID derivation purposes
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntityKey {
    kind: String,
    name: String,
    reference_digest: Option<String>,
    parent_path: String,
}

/// IdRegistry assigns content-derived SPDX IDs within one document.
///
/// An ID is `SPDXRef-<kind>-<name>-<hash>` where the hash covers the kind,
/// the name, the strongest checksum and the parent path. An entity's ID
/// therefore depends only on its own content and position, never on what
/// was registered before it. A numbered suffix is appended only when two
/// entities share all four.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    assigned: HashMap<String, EntityKey>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity and returns its ID
    ///
    /// # Arguments
    /// * `kind` - Entity kind used in the ID (`Image`, `Layer`, `File`, ...)
    /// * `name` - Entity name
    /// * `checksums` - All known digests; the strongest one is hashed in
    /// * `parent_path` - SPDX ID of the parent (the document for top-level
    ///   packages)
    ///
    /// # Errors
    /// Returns [`SbomError::IdCollision`] when every candidate is taken
    pub fn register(
        &mut self,
        kind: &str,
        name: &str,
        checksums: &Checksums,
        parent_path: &str,
    ) -> Result<String> {
        let key = EntityKey {
            kind: kind.to_string(),
            name: name.to_string(),
            reference_digest: ChecksumPriority::strongest(checksums)
                .map(|(algorithm, value)| format!("{}:{}", algorithm.intoto_name(), value)),
            parent_path: parent_path.to_string(),
        };

        let prefix = format!("SPDXRef-{}-{}", kind, sanitize_name(name));

        let base = format!("{}-{}", prefix, content_suffix(&key));
        if self.try_assign(&base, &key) {
            return Ok(base);
        }

        for n in 2..=MAX_DISAMBIGUATORS {
            let candidate = format!("{}-{}", base, n);
            if self.try_assign(&candidate, &key) {
                return Ok(candidate);
            }
        }

        Err(SbomError::IdCollision {
            name: name.to_string(),
            attempts: MAX_DISAMBIGUATORS,
        }
        .into())
    }

    pub fn contains(&self, spdx_id: &str) -> bool {
        spdx_id == DOCUMENT_ID || self.assigned.contains_key(spdx_id)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    fn try_assign(&mut self, candidate: &str, key: &EntityKey) -> bool {
        if candidate == DOCUMENT_ID || self.assigned.contains_key(candidate) {
            return false;
        }
        self.assigned.insert(candidate.to_string(), key.clone());
        true
    }
}

fn content_suffix(key: &EntityKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.kind.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.name.as_bytes());
    hasher.update([0u8]);
    if let Some(digest) = &key.reference_digest {
        hasher.update(digest.as_bytes());
    }
    hasher.update([0u8]);
    hasher.update(key.parent_path.as_bytes());
    let mut suffix = hex::encode(hasher.finalize());
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Reduces a name to the SPDX ID alphabet (`[A-Za-z0-9.-]`)
fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' };
        if mapped == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(mapped);
    }

    let trimmed: String = sanitized
        .trim_matches('-')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');

    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
