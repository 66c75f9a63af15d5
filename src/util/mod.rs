//! Utility functions shared by the engine and the CLI.
//!
//! - **Text**: NFC normalization, case folding for keyword comparison,
//!   excerpts and terminal-safe output
//! - **URL validation**: scheme and SSRF checks before a feed is probed or stored

mod text;
mod url_validator;

pub use text::{excerpt, fold_for_match, normalize_text, strip_control_chars, to_nfc};
pub use url_validator::{validate_feed_url, UrlValidationError};
