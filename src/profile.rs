//! Connection Profile Decoder
//!
//! The profile is a topology document describing the network's
//! organizations, peers, orderers and channels, supplied out-of-band as a
//! base64-encoded YAML string. It is treated as opaque structured data
//! except for one mutation: the network name is always overwritten with
//! [`NETWORK_NAME_OVERRIDE`](crate::config::NETWORK_NAME_OVERRIDE) after
//! parsing.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::config::NETWORK_NAME_OVERRIDE;
use crate::types::{Result, WicketError};

/// Decoded network topology descriptor.
///
/// Unknown fields are tolerated; the gateway only interprets the peer
/// endpoints and channel mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub network_name: Option<String>,

    #[serde(default)]
    pub organizations: BTreeMap<String, OrganizationSpec>,

    #[serde(default)]
    pub peers: BTreeMap<String, PeerSpec>,

    #[serde(default)]
    pub orderers: BTreeMap<String, OrdererSpec>,

    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSpec {
    #[serde(default)]
    pub msp_id: Option<String>,
    #[serde(default)]
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSpec {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdererSpec {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Peer names participating in this channel, in profile order
    #[serde(default)]
    pub peers: Vec<String>,
}

impl ConnectionProfile {
    /// Look up a channel by name; absence is fatal for the invocation.
    pub fn channel(&self, name: &str) -> Result<&ChannelSpec> {
        self.channels.get(name).ok_or_else(|| {
            WicketError::Ledger(format!("channel \"{name}\" is not present in the profile"))
        })
    }

    /// Endpoint of the first peer declared in the profile, used as the
    /// gateway peer for the session.
    pub fn gateway_peer_url(&self) -> Result<&str> {
        self.peers
            .values()
            .next()
            .map(|p| p.url.as_str())
            .ok_or_else(|| WicketError::Decode("profile declares no peers".to_string()))
    }
}

/// Decode a base64-encoded YAML connection profile.
///
/// Malformed base64 or malformed YAML is a fatal decode error. The
/// `network_name` field is unconditionally overwritten with the fixed
/// override after parsing; this is a deterministic step, not a conditional
/// one.
pub fn decode_profile(raw: &str) -> Result<ConnectionProfile> {
    let bytes = BASE64
        .decode(raw.trim())
        .map_err(|e| WicketError::Decode(format!("profile is not valid base64: {e}")))?;

    let yaml = std::str::from_utf8(&bytes)
        .map_err(|e| WicketError::Decode(format!("profile is not valid UTF-8: {e}")))?;

    let mut profile: ConnectionProfile = serde_yaml::from_str(yaml)
        .map_err(|e| WicketError::Decode(format!("profile is not valid YAML: {e}")))?;

    profile.network_name = Some(NETWORK_NAME_OVERRIDE.to_string());

    Ok(profile)
}
