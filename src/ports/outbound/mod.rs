/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, registries, console, etc.).
pub mod artifact_inspector;
pub mod formatter;
pub mod output_presenter;
pub mod progress_reporter;
pub mod statement_reader;

pub use artifact_inspector::{ArtifactInspector, ExtractedTarball, InspectionOptions};
pub use formatter::SpdxFormatter;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use statement_reader::StatementReader;
