use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fs;
use std::path::{Component, Path};

/// Maximum size of a provenance statement (64 MB)
pub const MAX_STATEMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum size of a single metadata file read out of an image (16 MB).
/// Applies to manifests, configs and package databases, not to layers.
pub const MAX_METADATA_SIZE: u64 = 16 * 1024 * 1024;

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Security
/// Uses `symlink_metadata()` so the link itself is checked, not its target.
///
/// # Errors
/// Returns [`SbomError::SecurityError`] for symlinks and
/// [`SbomError::InvalidInputPath`] for missing paths or non-files.
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SbomError::InvalidInputPath {
        path: path.to_path_buf(),
        reason: format!("Failed to read {} metadata: {}", file_description, e),
    })?;

    if metadata.is_symlink() {
        return Err(SbomError::SecurityError {
            path: path.to_path_buf(),
            reason: format!("{} is a symbolic link", file_description),
            hint: "Pass the path of the real file instead of a link".to_string(),
        }
        .into());
    }

    if !metadata.is_file() {
        return Err(SbomError::InvalidInputPath {
            path: path.to_path_buf(),
            reason: format!("{} is not a regular file", file_description),
        }
        .into());
    }

    Ok(())
}

/// Validates file size is within acceptable limits
///
/// # Errors
/// Returns an error if the file size exceeds the maximum
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Reads a regular file as UTF-8 after the symlink, type and size checks.
pub fn read_checked_file(path: &Path, file_description: &str, max_size: u64) -> Result<String> {
    validate_regular_file(path, file_description)?;

    let size = fs::metadata(path)
        .map_err(|e| SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?
        .len();
    validate_file_size(size, path, max_size)?;

    fs::read_to_string(path).map_err(|e| {
        SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

/// Rejects archive-internal paths that are absolute or climb out of their root.
///
/// Blob names come from manifests inside untrusted tarballs, so they are
/// resolved against the extraction directory only after this check.
pub fn validate_archive_member(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if name.is_empty() || escapes {
        anyhow::bail!("Security: archive member '{}' escapes the archive root", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_regular_file_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("provenance.json");
        fs::write(&file_path, "{}").unwrap();

        assert!(validate_regular_file(&file_path, "provenance file").is_ok());
    }

    #[test]
    fn test_validate_regular_file_is_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_regular_file(temp_dir.path(), "provenance file");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a regular file"));
    }

    #[test]
    fn test_validate_regular_file_missing() {
        let result = validate_regular_file(Path::new("/nonexistent/file.json"), "statement");
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_regular_file_rejects_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real.json");
        fs::write(&target, "{}").unwrap();
        let link = temp_dir.path().join("link.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = validate_regular_file(&link, "statement").unwrap_err();
        assert!(err.to_string().contains("Security violation"));
    }

    #[test]
    fn test_validate_file_size_exceeds_limit() {
        let path = PathBuf::from("/test/file.txt");
        let result = validate_file_size(MAX_STATEMENT_SIZE + 1, &path, MAX_STATEMENT_SIZE);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_read_checked_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("manifest.json");
        fs::write(&file_path, "[]").unwrap();

        let content = read_checked_file(&file_path, "manifest", MAX_METADATA_SIZE).unwrap();
        assert_eq!(content, "[]");

        let too_small = read_checked_file(&file_path, "manifest", 1);
        assert!(too_small.is_err());
    }

    #[test]
    fn test_validate_archive_member() {
        assert!(validate_archive_member("blobs/sha256/abc").is_ok());
        assert!(validate_archive_member("abc/layer.tar").is_ok());
        assert!(validate_archive_member("../etc/passwd").is_err());
        assert!(validate_archive_member("/etc/passwd").is_err());
        assert!(validate_archive_member("blobs/../../x").is_err());
        assert!(validate_archive_member("").is_err());
    }
}
