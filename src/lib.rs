//! Wicket - serverless gateway for a permissioned ledger network
//!
//! "A small gate set into a larger one"
//!
//! Wicket brokers access to a permissioned distributed-ledger network on
//! behalf of callers identified by a username. Each invocation resolves the
//! caller's credentials from the secret store, opens a short-lived gateway
//! session against the network described by the connection profile, and
//! routes the request to either the query or the invoke path.
//!
//! ## Pipeline
//!
//! - **Identity**: per-user credential assembly from three secret lookups
//! - **Profile**: base64+YAML connection-profile decoding
//! - **Gateway**: session establishment with hang-avoidance timeouts
//! - **Dispatch**: functionType routing with annotated error reporting

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod profile;
pub mod secrets;
pub mod types;

pub use config::Args;
pub use dispatch::{handle, AppState};
pub use types::{Result, WicketError};
