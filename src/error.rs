//! Adjustment engine error types.

use thiserror::Error;

/// Errors that can occur while computing or reconstructing adjustments.
#[derive(Error, Debug)]
pub enum AdjustmentError {
    /// Unknown adjustment type tag.
    #[error("Unknown adjustment type tag: {0}")]
    InvalidTypeTag(String),

    /// A record referenced by a persisted adjustment no longer resolves.
    #[error("{kind} not found: {id}")]
    MissingReference { kind: &'static str, id: String },

    /// The target lacks a capability the adjuster requires.
    #[error("Adjuster {adjuster} cannot target a {got} adjustable, expected {expected}")]
    UnsupportedAdjustable {
        adjuster: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// Attempt to mutate a locked adjustment through the engine.
    #[error("Adjustment {id} is locked")]
    LockedAdjustment { id: String },

    /// A persisted data payload is missing fields the adjuster needs.
    #[error("Malformed data payload for adjuster {adjuster}: {detail}")]
    MalformedData {
        adjuster: &'static str,
        detail: String,
    },
}
