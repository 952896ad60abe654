/// Mock implementations for testing
mod mock_inspector;
mod mock_progress_reporter;
mod mock_statement_reader;

pub use mock_inspector::MockInspector;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_statement_reader::MockStatementReader;
