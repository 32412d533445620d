//! Session establishment integration tests

mod common;

use common::{encoded_profile, test_args, MemoryResolver, RecordingConnector};
use wicket::config::DEFAULT_COMMIT_TIMEOUT_MS;
use wicket::gateway::{setup_network, CommitAck};
use wicket::types::WicketError;

#[tokio::test]
async fn test_setup_network_resolves_channel_handle() {
    let args = test_args();
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let handle = setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();

    assert_eq!(handle.name(), "assets");
    assert_eq!(
        resolver.requested(),
        vec![
            "ledger/alice/cert".to_string(),
            "ledger/alice/pk".to_string(),
            "ledger/alice/mspId".to_string(),
        ]
    );

    let open = connector.last_open();
    assert_eq!(open.endpoint, "wss://peer0.org1.example.com:7051");
    assert_eq!(open.msp_id, "Org1MSP");
}

#[tokio::test]
async fn test_hang_avoidance_options_applied_every_time() {
    let args = test_args();
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();
    setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();

    for open in connector.opens.lock().unwrap().iter() {
        assert!(!open.options.discovery_enabled);
        assert!(!open.options.as_localhost);
        assert_eq!(open.options.commit_timeout_ms, DEFAULT_COMMIT_TIMEOUT_MS);
        assert_eq!(open.options.commit_ack, CommitAck::None);
    }
}

#[tokio::test]
async fn test_missing_profile_fails_before_any_lookup() {
    let mut args = test_args();
    args.profile_encoded = None;
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let result = setup_network(&resolver, &args, &connector, "alice", "assets").await;

    let err = result.unwrap_err();
    assert!(matches!(err, WicketError::Config(_)));
    assert!(err.to_string().contains("PROFILE_ENCODED"));

    // Configuration is validated before identity work is spent
    assert!(resolver.requested().is_empty());
    assert_eq!(connector.open_count(), 0);
}

#[tokio::test]
async fn test_malformed_profile_is_decode_error() {
    let mut args = test_args();
    args.profile_encoded = Some("!!! not base64 !!!".to_string());
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let result = setup_network(&resolver, &args, &connector, "alice", "assets").await;

    assert!(matches!(result, Err(WicketError::Decode(_))));
    assert_eq!(connector.open_count(), 0);
}

#[tokio::test]
async fn test_secret_failure_aborts_establishment() {
    let args = test_args();
    let resolver = MemoryResolver::empty();
    let connector = RecordingConnector::new();

    let result = setup_network(&resolver, &args, &connector, "alice", "assets").await;

    assert!(matches!(result, Err(WicketError::Secret(_))));
    assert_eq!(connector.open_count(), 0);
}

#[tokio::test]
async fn test_unknown_channel_is_fatal_after_session_opens() {
    let args = test_args();
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let result = setup_network(&resolver, &args, &connector, "alice", "licenses").await;

    let err = result.unwrap_err();
    assert!(matches!(err, WicketError::Ledger(_)));
    assert!(err.to_string().contains("licenses"));
}

#[tokio::test]
async fn test_evaluate_envelope_carries_identity_and_bound() {
    let args = test_args();
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let handle = setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();
    handle
        .evaluate("Accounts", &["Org1".to_string()])
        .await
        .unwrap();

    let (envelope, timeout_ms) = connector.transport.last_request();
    assert_eq!(envelope["type"], "evaluate");
    assert_eq!(envelope["channel"], "assets");
    assert_eq!(envelope["function"], "Accounts");
    assert_eq!(envelope["args"][0], "Org1");
    assert_eq!(envelope["msp_id"], "Org1MSP");
    assert_eq!(timeout_ms, DEFAULT_COMMIT_TIMEOUT_MS);
}

#[tokio::test]
async fn test_submit_never_waits_for_commit_events() {
    let args = test_args();
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let handle = setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();
    handle.submit("OnboardAsset", &[]).await.unwrap();

    let (envelope, timeout_ms) = connector.transport.last_request();
    assert_eq!(envelope["type"], "submit");
    assert_eq!(envelope["wait_commit"], false);
    assert_eq!(timeout_ms, DEFAULT_COMMIT_TIMEOUT_MS);
}

#[tokio::test]
async fn test_configured_commit_bound_reaches_transport() {
    let mut args = test_args();
    args.commit_timeout_ms = 250;
    let resolver = MemoryResolver::with_user("ledger", "alice");
    let connector = RecordingConnector::new();

    let handle = setup_network(&resolver, &args, &connector, "alice", "assets")
        .await
        .unwrap();
    handle.submit("OnboardAsset", &[]).await.unwrap();

    let (_, timeout_ms) = connector.transport.last_request();
    assert_eq!(timeout_ms, 250);
    assert_eq!(connector.last_open().options.commit_timeout_ms, 250);
}

#[test]
fn test_profile_helper_round_trips() {
    // The fixture profile used across these tests must itself decode.
    let profile = wicket::profile::decode_profile(&encoded_profile()).unwrap();
    assert!(profile.channel("assets").is_ok());
}
