/// Type alias for Result with anyhow::Error as the error type.
/// Domain errors are raised as [`crate::shared::error::SbomError`] and carried inside.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
