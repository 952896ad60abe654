use crate::adapters::outbound::formatters::{SpdxJsonFormatter, TagValueFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::SpdxFormatter;

/// Factory for creating SPDX formatters
///
/// Selects the serialization adapter for an [`OutputFormat`], so the CLI
/// never names a concrete formatter.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Examples
    /// ```
    /// use spdx_bom::application::dto::OutputFormat;
    /// use spdx_bom::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::TagValue);
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn SpdxFormatter> {
        match format {
            OutputFormat::Json => Box::new(SpdxJsonFormatter::new()),
            OutputFormat::TagValue => Box::new(TagValueFormatter::new()),
        }
    }

    /// Returns the progress message for the specified output format
    ///
    /// # Examples
    /// ```
    /// use spdx_bom::application::dto::OutputFormat;
    /// use spdx_bom::application::factories::FormatterFactory;
    ///
    /// let message = FormatterFactory::progress_message(OutputFormat::Json);
    /// assert_eq!(message, "📝 Generating SPDX JSON output...");
    /// ```
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Generating SPDX JSON output...",
            OutputFormat::TagValue => "📝 Generating SPDX tag-value output...",
        }
    }
}
