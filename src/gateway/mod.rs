//! Session Establisher - short-lived gateway sessions against the network
//!
//! A session is opened per invocation from the decoded connection profile
//! and the caller's credential identity, then yields a handle to one named
//! channel. The session options encode a hang-avoidance policy: peer
//! discovery is disabled, so commit events may never arrive; submissions
//! therefore use no acknowledgment strategy and every commit-related wait
//! is bounded.

pub mod peer;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{Args, DEFAULT_COMMIT_TIMEOUT_MS};
use crate::identity::{build_identity, Identity, Wallet};
use crate::profile::{decode_profile, ConnectionProfile};
use crate::secrets::SecretResolver;
use crate::types::{Result, WicketError};

pub use peer::PeerConnector;

/// Commit acknowledgment strategy for transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitAck {
    /// Do not wait for peer commit events. Under a disabled-discovery
    /// topology the session never learns which peers would emit them, so
    /// waiting could block until the platform kills the invocation.
    #[default]
    None,
    /// Wait for every contacted peer to report commit, still bounded by
    /// `commit_timeout_ms`.
    AllPeers,
}

/// Session parameters. `Default` encodes the hang-avoidance policy every
/// invocation runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Automatic peer discovery; always off, the profile is authoritative
    pub discovery_enabled: bool,
    /// Rewrite peer hosts to 127.0.0.1 (local development topologies only)
    pub as_localhost: bool,
    /// Hard upper bound on any commit-related wait, in milliseconds
    pub commit_timeout_ms: u64,
    /// Commit acknowledgment strategy
    pub commit_ack: CommitAck,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            discovery_enabled: false,
            as_localhost: false,
            commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
            commit_ack: CommitAck::None,
        }
    }
}

impl GatewayOptions {
    /// Options for one invocation: the policy defaults with the configured
    /// commit bound.
    pub fn from_config(config: &Args) -> Self {
        Self {
            commit_timeout_ms: config.commit_timeout_ms,
            ..Self::default()
        }
    }
}

/// Opens the transport session beneath a gateway. The production
/// implementation speaks WebSocket to the gateway peer; tests substitute a
/// recording double.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn open(
        &self,
        endpoint: &str,
        identity: &Identity,
        options: &GatewayOptions,
    ) -> Result<Arc<dyn LedgerTransport>>;
}

/// One request/response exchange with the network, bounded by `timeout_ms`.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn request(&self, payload: Vec<u8>, timeout_ms: u64) -> Result<Vec<u8>>;
}

/// A live client session against the ledger network for one identity.
pub struct Session {
    profile: ConnectionProfile,
    identity: Identity,
    options: GatewayOptions,
    transport: Arc<dyn LedgerTransport>,
}

/// Gateway entry point: validates inputs and opens the session transport.
pub struct Gateway;

impl Gateway {
    /// Open a session for `username` using the decoded profile and the
    /// wallet built for this invocation.
    ///
    /// The wallet must hold the connecting identity under the username key;
    /// a session is only returned once the transport is fully open, so no
    /// partially-initialized session is ever exposed.
    pub async fn connect(
        profile: ConnectionProfile,
        wallet: &Wallet,
        identity: Identity,
        options: GatewayOptions,
        connector: &dyn LedgerConnector,
        username: &str,
    ) -> Result<Session> {
        if wallet.get(username).is_none() {
            return Err(WicketError::Ledger(format!(
                "wallet holds no identity for \"{username}\""
            )));
        }

        let endpoint = profile.gateway_peer_url()?.to_string();
        let endpoint = if options.as_localhost {
            as_localhost_url(&endpoint)
        } else {
            endpoint
        };

        info!(
            username = %username,
            msp_id = %identity.msp_id,
            endpoint = %endpoint,
            discovery = options.discovery_enabled,
            commit_timeout_ms = options.commit_timeout_ms,
            "Opening gateway session"
        );

        let transport = connector.open(&endpoint, &identity, &options).await?;

        Ok(Session {
            profile,
            identity,
            options,
            transport,
        })
    }
}

impl Session {
    /// Resolve a handle to one named channel within this session.
    ///
    /// Fails if the channel is not present in the profile topology; channel
    /// resolution failures are fatal, never retried.
    pub fn channel(&self, name: &str) -> Result<ChannelHandle> {
        self.profile.channel(name)?;
        debug!(channel = %name, "Resolved channel handle");
        Ok(ChannelHandle {
            name: name.to_string(),
            msp_id: self.identity.msp_id.clone(),
            certificate: self.identity.certificate.clone(),
            options: self.options.clone(),
            transport: Arc::clone(&self.transport),
        })
    }
}

/// A reference to one named logical channel within an open session.
pub struct ChannelHandle {
    name: String,
    msp_id: String,
    certificate: String,
    options: GatewayOptions,
    transport: Arc<dyn LedgerTransport>,
}

impl std::fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("name", &self.name)
            .field("msp_id", &self.msp_id)
            .field("certificate", &self.certificate)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ChannelHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate a read-only query against the channel. No ordering, no
    /// commit wait; the exchange is still bounded so the invocation can
    /// never hang on a silent peer.
    pub async fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let payload = self.envelope("evaluate", function, args, false)?;
        self.transport
            .request(payload, self.options.commit_timeout_ms)
            .await
    }

    /// Submit a transaction for ordering. Whether the exchange waits for
    /// peer commit acknowledgment follows the session's `CommitAck`
    /// strategy; the wait is bounded by `commit_timeout_ms` either way.
    pub async fn submit(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let wait_commit = self.options.commit_ack == CommitAck::AllPeers;
        let payload = self.envelope("submit", function, args, wait_commit)?;
        self.transport
            .request(payload, self.options.commit_timeout_ms)
            .await
    }

    fn envelope(
        &self,
        kind: &str,
        function: &str,
        args: &[String],
        wait_commit: bool,
    ) -> Result<Vec<u8>> {
        let envelope = json!({
            "type": kind,
            "channel": self.name,
            "function": function,
            "args": args,
            "msp_id": self.msp_id,
            "certificate": self.certificate,
            "wait_commit": wait_commit,
        });
        serde_json::to_vec(&envelope)
            .map_err(|e| WicketError::Ledger(format!("failed to encode request: {e}")))
    }
}

/// Establish a channel handle for one invocation.
///
/// Required configuration is validated before any secret lookup is issued,
/// so an absent profile fails fast without spending secret-store calls.
/// Then, in order: build the identity, decode the profile, open the session
/// with the hang-avoidance options, resolve the channel.
pub async fn setup_network(
    resolver: &dyn SecretResolver,
    config: &Args,
    connector: &dyn LedgerConnector,
    username: &str,
    channel: &str,
) -> Result<ChannelHandle> {
    let raw_profile = config.require_profile().map_err(WicketError::Config)?;

    let (identity, wallet) = build_identity(resolver, &config.secrets_prefix, username).await?;

    let profile = decode_profile(raw_profile)?;

    let options = GatewayOptions::from_config(config);
    let session = Gateway::connect(profile, &wallet, identity, options, connector, username).await?;

    session.channel(channel)
}

/// Rewrite the host of a peer endpoint to the loopback address, keeping
/// scheme and port.
fn as_localhost_url(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let after_scheme = &url[scheme_end + 3..];
        if let Some(port_start) = after_scheme.rfind(':') {
            return format!("{}://127.0.0.1{}", &url[..scheme_end], &after_scheme[port_start..]);
        }
        return format!("{}://127.0.0.1", &url[..scheme_end]);
    }
    url.to_string()
}
