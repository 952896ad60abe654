use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Digest algorithms understood by the graph and the correlator.
///
/// Ordering only drives serialization order; strength is decided by
/// [`crate::sbom_generation::policies::ChecksumPriority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA384")]
    Sha384,
    #[serde(rename = "SHA512")]
    Sha512,
    #[serde(rename = "MD5")]
    Md5,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 5] = [
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Sha256,
        ChecksumAlgorithm::Sha384,
        ChecksumAlgorithm::Sha512,
        ChecksumAlgorithm::Md5,
    ];

    /// Name used in SPDX documents (`SHA256`)
    pub fn spdx_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "SHA1",
            ChecksumAlgorithm::Sha256 => "SHA256",
            ChecksumAlgorithm::Sha384 => "SHA384",
            ChecksumAlgorithm::Sha512 => "SHA512",
            ChecksumAlgorithm::Md5 => "MD5",
        }
    }

    /// Name used in in-toto digest sets (`sha256`)
    pub fn intoto_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha384 => "sha384",
            ChecksumAlgorithm::Sha512 => "sha512",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }

    /// Expected length of the lower-case hex digest
    pub fn hex_len(self) -> usize {
        match self {
            ChecksumAlgorithm::Sha1 => 40,
            ChecksumAlgorithm::Sha256 => 64,
            ChecksumAlgorithm::Sha384 => 96,
            ChecksumAlgorithm::Sha512 => 128,
            ChecksumAlgorithm::Md5 => 32,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spdx_name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    /// Accepts both SPDX (`SHA256`) and in-toto (`sha256`, `sha-256`) spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "sha384" => Ok(ChecksumAlgorithm::Sha384),
            "sha512" => Ok(ChecksumAlgorithm::Sha512),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            _ => Err(format!("Unsupported checksum algorithm: {}", s)),
        }
    }
}

/// Checksums of one entity, keyed by algorithm. Values are lower-case hex.
pub type Checksums = BTreeMap<ChecksumAlgorithm, String>;

/// Returns true when `value` is non-empty lower-case hexadecimal.
pub fn is_lower_hex(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Converts an in-toto digest set into typed checksums, dropping algorithms
/// this crate cannot compare (`gitCommit`, `dirHash`, ...).
pub fn checksums_from_digest_set(digests: &BTreeMap<String, String>) -> Checksums {
    digests
        .iter()
        .filter_map(|(name, value)| {
            name.parse::<ChecksumAlgorithm>()
                .ok()
                .map(|algorithm| (algorithm, value.to_ascii_lowercase()))
        })
        .collect()
}
