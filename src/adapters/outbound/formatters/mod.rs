/// Formatter adapters for the SPDX output encodings
mod spdx_json_formatter;
mod tag_value_formatter;

pub use spdx_json_formatter::SpdxJsonFormatter;
pub use tag_value_formatter::TagValueFormatter;
