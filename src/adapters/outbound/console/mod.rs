/// Console adapters for user feedback
mod progress_reporter;
mod verification_summary;

pub use progress_reporter::StderrProgressReporter;
pub use verification_summary::VerificationSummary;
