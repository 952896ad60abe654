use crate::sbom_generation::domain::{ChecksumAlgorithm, Checksums};

/// ChecksumPriority policy for choosing a single reference digest
///
/// Whenever an operation needs one digest out of several (ID derivation,
/// correlation tie-breaks), the strongest available algorithm wins:
/// SHA-512 > SHA-384 > SHA-256 > SHA-1 > MD5.
pub struct ChecksumPriority;

impl ChecksumPriority {
    /// Relative strength of an algorithm; higher is stronger
    pub fn strength(algorithm: ChecksumAlgorithm) -> u8 {
        match algorithm {
            ChecksumAlgorithm::Sha512 => 5,
            ChecksumAlgorithm::Sha384 => 4,
            ChecksumAlgorithm::Sha256 => 3,
            ChecksumAlgorithm::Sha1 => 2,
            ChecksumAlgorithm::Md5 => 1,
        }
    }

    /// Returns the strongest digest of a checksum set
    pub fn strongest(checksums: &Checksums) -> Option<(ChecksumAlgorithm, &str)> {
        checksums
            .iter()
            .max_by_key(|(algorithm, _)| Self::strength(**algorithm))
            .map(|(algorithm, value)| (*algorithm, value.as_str()))
    }

    /// Returns the strongest algorithm present in both sets
    pub fn strongest_common(left: &Checksums, right: &Checksums) -> Option<ChecksumAlgorithm> {
        left.keys()
            .filter(|algorithm| right.contains_key(algorithm))
            .max_by_key(|algorithm| Self::strength(**algorithm))
            .copied()
    }
}
