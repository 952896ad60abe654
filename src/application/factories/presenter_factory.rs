use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::OutputPresenter;
use std::path::{Path, PathBuf};

/// Where the serialized document is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterType {
    Stdout,
    File(PathBuf),
}

impl PresenterType {
    /// Resolves the `--output` value for a document
    ///
    /// No value means stdout. An existing directory receives
    /// `<document name>.<extension>`, with the extension taken from the
    /// output format; any other path is used as given.
    pub fn resolve(output: Option<PathBuf>, document_name: &str, format: OutputFormat) -> Self {
        match output {
            None => PresenterType::Stdout,
            Some(path) if path.is_dir() => {
                PresenterType::File(path.join(default_file_name(document_name, format)))
            }
            Some(path) => PresenterType::File(path),
        }
    }
}

/// `<name>.spdx.json` or `<name>.spdx`, with the name reduced to a safe file name
pub fn default_file_name(document_name: &str, format: OutputFormat) -> String {
    let stem: String = document_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{}.{}", stem, format.file_extension())
}

/// Selects the presenter adapter for a resolved destination
pub struct PresenterFactory;

impl PresenterFactory {
    /// # Examples
    /// ```
    /// use spdx_bom::application::dto::OutputFormat;
    /// use spdx_bom::application::factories::{PresenterFactory, PresenterType};
    ///
    /// let target = PresenterType::resolve(None, "debian.tar", OutputFormat::Json);
    /// let presenter = PresenterFactory::create(target);
    /// assert_eq!(presenter.destination(), "stdout");
    /// ```
    pub fn create(presenter_type: PresenterType) -> Box<dyn OutputPresenter> {
        match presenter_type {
            PresenterType::Stdout => Box::new(StdoutPresenter::new()),
            PresenterType::File(path) => Box::new(FileSystemWriter::new(path)),
        }
    }

    /// Shorthand for [`PresenterType::resolve`] followed by [`PresenterFactory::create`]
    pub fn for_document(
        output: Option<&Path>,
        document_name: &str,
        format: OutputFormat,
    ) -> Box<dyn OutputPresenter> {
        Self::create(PresenterType::resolve(
            output.map(Path::to_path_buf),
            document_name,
            format,
        ))
    }
}
