//! Log line parsing
//!
//! This module turns raw access-log lines into [`LogRecord`]s:
//! - Skipping directive (`#`) and blank lines
//! - Splitting fields with awareness of quoted values
//! - Dropping lines with too few fields

mod record;
mod tokenizer;

pub use record::{parse_line, LogRecord, ParsedLine, MIN_FIELDS};
pub use tokenizer::tokenize;
