//! Error taxonomy and crate-wide result alias.
//!
//! Every failure in the invocation path maps onto one of these variants:
//! configuration and decode errors are fatal before any network I/O, secret
//! errors fail the whole invocation, dispatch and ledger errors are caught
//! at the dispatcher boundary and reported through the failure shape.

use thiserror::Error;

/// Errors produced by the gateway pipeline.
#[derive(Debug, Error)]
pub enum WicketError {
    /// Missing or invalid invocation configuration (profile, secret prefix).
    #[error("configuration error: {0}")]
    Config(String),

    /// A secret lookup failed; no partial identity is ever built.
    #[error("secret resolution failed: {0}")]
    Secret(String),

    /// The connection profile could not be decoded (base64 or YAML stage).
    #[error("profile decode error: {0}")]
    Decode(String),

    /// The request body was unparseable or named an unknown functionType.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Session establishment, channel resolution, or handler failure.
    #[error("ledger error: {0}")]
    Ledger(String),
}

pub type Result<T> = std::result::Result<T, WicketError>;

/// Source-location tag prepended to errors crossing the platform callback
/// boundary, so a failed invocation can be traced back to the site that
/// reported it.
#[track_caller]
pub fn pin() -> String {
    let loc = std::panic::Location::caller();
    // File paths are workspace-relative in release builds; keep only the
    // final component so the tag stays short.
    let file = loc.file().rsplit('/').next().unwrap_or(loc.file());
    format!("{}-L{}", file, loc.line())
}
