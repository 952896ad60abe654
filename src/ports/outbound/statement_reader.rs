use crate::sbom_generation::domain::Statement;
use crate::shared::Result;
use std::path::Path;

/// StatementReader port for loading provenance statements
///
/// This port abstracts where in-toto statements come from. Implementations
/// read exactly one source and have no other side effects.
pub trait StatementReader {
    /// Loads and validates one statement
    ///
    /// # Errors
    /// Returns an error if:
    /// - The source cannot be read
    /// - The content is not a well-formed statement (parse error)
    /// - The statement breaks a semantic rule, such as an empty subject list
    ///   or a material without digests (validation error)
    fn load_statement(&self, path: &Path) -> Result<Statement>;
}
