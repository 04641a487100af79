//! Embedded prompts
//!
//! Compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Task-generation system prompt
pub const COACH: &str = include_str!("../../prompts/coach.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "coach" => Some(COACH),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
