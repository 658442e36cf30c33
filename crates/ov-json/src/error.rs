use thiserror::Error;

/// Failure detail behind a [`crate::Decode::Error`] outcome.
///
/// The public decode contract still returns a state enum (spec.md §7's
/// "component APIs return boolean success or a small sentinel"); this
/// type exists for logging and for the bridge's JSON error response
/// `"description"` field, the one place spec.md allows detail to surface.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParserError {
    #[error("serde_json rejected the matched object: {0}")]
    Malformed(String),
}
