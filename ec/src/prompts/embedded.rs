//! Embedded fallback prompts
//!
//! Compiled into the binary and used when no override file is found.

/// Transformation analysis prompt
pub const ANALYZE: &str = include_str!("../../prompts/analyze.pmt");

/// Executive summary prompt
pub const SUMMARIZE: &str = include_str!("../../prompts/summarize.pmt");

/// Get an embedded prompt by template name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "analyze" => Some(ANALYZE),
        "summarize" => Some(SUMMARIZE),
        _ => None,
    }
}
