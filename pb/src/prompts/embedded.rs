//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Pitch deck copy prompt
pub const PITCH: &str = include_str!("../../prompts/pitch.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "pitch" => {
            debug!("get_embedded: matched pitch");
            Some(PITCH)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
