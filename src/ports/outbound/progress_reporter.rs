/// ProgressReporter port for user feedback during a run
///
/// Inspection and pulling can take minutes for large images, so the
/// application layer reports each artifact as it finishes. Domain services
/// never report; only use cases hold a reporter.
pub trait ProgressReporter {
    /// Reports a progress message
    fn report(&self, message: &str);

    /// Reports how many artifacts have been processed
    ///
    /// # Arguments
    /// * `current` - Artifacts finished so far
    /// * `total` - Artifacts requested
    /// * `message` - Optional detail, usually the artifact reference
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports a failed artifact or a warning; the run goes on
    fn report_error(&self, message: &str);

    /// Reports completion of an operation
    fn report_completion(&self, message: &str);
}
