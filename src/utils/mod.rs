pub mod string_util;

pub use string_util::{StripCodeBlock, format_thousands, truncate_chars};
