use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - document written, no digest mismatch, every artifact inspected
    Success = 0,
    /// A provenance digest mismatch was found or an artifact failed to inspect
    VerificationFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (provenance error, invariant violation, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VerificationFailed => write!(f, "Verification Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for SPDX generation and provenance correlation.
///
/// Uses thiserror to derive Display and Error traits automatically,
/// reducing boilerplate while maintaining user-friendly error messages.
#[derive(Debug, Error)]
pub enum SbomError {
    #[error("Failed to parse provenance statement: {path}\nDetails: {details}\n\n💡 Hint: The file must be an in-toto statement with 'subject' and 'predicate' fields")]
    StatementParse { path: PathBuf, details: String },

    #[error("Invalid provenance statement: {path}\nReason: {reason}")]
    StatementValidation { path: PathBuf, reason: String },

    #[error("Failed to read tarball: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file is a readable, uncorrupted tar archive")]
    TarballRead { path: PathBuf, details: String },

    #[error("Failed to inspect image tarball: {path}\nDetails: {details}")]
    Inspection { path: PathBuf, details: String },

    #[error("Failed to pull image: {reference}\nDetails: {details}\n\n💡 Hint: Check the image reference and your network access to the registry")]
    Registry { reference: String, details: String },

    /// An artifact could not contribute its subgraph; the run continues without it
    #[error("Failed to build SPDX graph for artifact: {artifact}")]
    GraphBuild {
        artifact: String,
        #[source]
        source: anyhow::Error,
    },

    /// The finished document violates a graph invariant (builder bug, fatal)
    #[error("Internal invariant violated ({invariant}): {details}")]
    Invariant {
        invariant: &'static str,
        details: String,
    },

    #[error("Unable to assign a unique SPDX ID to '{name}' after {attempts} attempts")]
    IdCollision { name: String, attempts: usize },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Invalid input path: {path}\nReason: {reason}\n\n💡 Hint: Please specify an existing image tarball or provenance file")]
    InvalidInputPath { path: PathBuf, reason: String },

    /// Validation error for builder patterns and configuration
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },
}

impl SbomError {
    /// Whether this error must abort the whole run instead of a single artifact.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SbomError::Invariant { .. } | SbomError::IdCollision { .. }
        )
    }
}

/// Returns true when any error in the chain is a fatal [`SbomError`].
pub fn is_fatal(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<SbomError>()
            .is_some_and(SbomError::is_fatal)
    })
}
