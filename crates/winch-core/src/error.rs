//! Error types

/// winch error
///
/// `Clone` so that a single rejection can be handed to every holder of a
/// shared [`Completion`](crate::Completion).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WinchError {
    /// A throttle request named an operation that was never defined.
    #[error("Not a Function")]
    NotAFunction,

    #[error("Error during scroller selection, most likely a bad selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
