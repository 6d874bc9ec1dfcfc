//! Gesture engine error types

use thiserror::Error;

use crate::state::RecognizerId;

/// Errors from building or reconfiguring recognizers
///
/// Malformed input at runtime is never an error: it degrades to a rejection
/// or is ignored and logged.
#[derive(Error, Debug)]
pub enum GestureError {
    /// Recognizer is not registered on this surface
    #[error("Unknown recognizer: {0:?}")]
    UnknownRecognizer(RecognizerId),

    /// Finger window outside `1 <= min <= max <= limit`
    #[error("Invalid finger window: min {min}, max {max} (limit {limit})")]
    InvalidFingerWindow { min: usize, max: usize, limit: usize },

    /// Group operation on a leaf recognizer
    #[error("Recognizer {0:?} is not a gesture group")]
    NotAGroup(RecognizerId),

    /// Children of a group are arbitrated by the group, not the referee
    #[error("Recognizer {0:?} belongs to a gesture group and cannot be a candidate")]
    AlreadyGrouped(RecognizerId),

    /// Grouping would make a group its own descendant
    #[error("Grouping {child:?} under {group:?} would create a cycle")]
    CyclicGroup {
        group: RecognizerId,
        child: RecognizerId,
    },

    /// The same recognizer listed twice in one group
    #[error("Duplicate child {0:?} in gesture group")]
    DuplicateChild(RecognizerId),

    /// Configuration value out of range
    #[error("Invalid gesture config: {0}")]
    InvalidConfig(String),

    /// Configuration text failed to parse
    #[error(transparent)]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for gesture operations
pub type Result<T> = std::result::Result<T, GestureError>;
