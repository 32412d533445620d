//! Configuration for Wicket
//!
//! Environment variable handling using clap, loaded once at cold start.
//! The serverless platform supplies everything through the environment;
//! per-request parameters (username, channel) arrive in the request body.

use clap::Parser;

/// Commit-acknowledgment wait bound in milliseconds.
///
/// With peer discovery disabled the session never learns which peers would
/// emit commit events, so a submission that waited on them could block
/// until the platform kills the invocation. Submissions therefore use no
/// acknowledgment strategy and bound every commit-related wait by this
/// value.
pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 100;

/// Fixed network name stamped onto every decoded connection profile.
///
/// The profile is supplied out-of-band and may carry whatever name the
/// tooling that exported it used; the gateway always operates under this
/// one. Applied unconditionally after decoding.
pub const NETWORK_NAME_OVERRIDE: &str = "wicket-net";

/// Wicket - serverless gateway for a permissioned ledger network
#[derive(Parser, Debug, Clone)]
#[command(name = "wicket")]
#[command(about = "Serverless gateway brokering access to a permissioned ledger network")]
pub struct Args {
    /// Secret-namespace prefix for per-user identity material.
    /// Lookups are scoped as `<prefix>/<username>/<field>`.
    #[arg(long, env = "SECRETS_PREFIX")]
    pub secrets_prefix: String,

    /// Base64-encoded YAML connection profile describing the network
    /// topology. Absence is a fatal configuration error at request time.
    #[arg(long, env = "PROFILE_ENCODED")]
    pub profile_encoded: Option<String>,

    /// Commit-acknowledgment wait bound in milliseconds
    #[arg(long, env = "COMMIT_TIMEOUT_MS", default_value_t = DEFAULT_COMMIT_TIMEOUT_MS)]
    pub commit_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration known at cold start.
    ///
    /// The connection profile is deliberately not required here: its absence
    /// is reported per-request by the session establisher, before any secret
    /// lookup is issued.
    pub fn validate(&self) -> Result<(), String> {
        if self.secrets_prefix.trim().is_empty() {
            return Err("SECRETS_PREFIX must not be empty".to_string());
        }
        if self.commit_timeout_ms == 0 {
            return Err("COMMIT_TIMEOUT_MS must be greater than zero".to_string());
        }
        Ok(())
    }

    /// The raw encoded profile, or a configuration error naming the
    /// variable that should have supplied it.
    pub fn require_profile(&self) -> Result<&str, String> {
        self.profile_encoded
            .as_deref()
            .ok_or_else(|| {
                "The connection profile was not provided via the \"PROFILE_ENCODED\" env var"
                    .to_string()
            })
    }
}
