//! Query and invoke paths
//!
//! Both paths obtain a channel handle through the session establisher and
//! exercise the named chaincode function with the request's args. Their
//! ledger-side semantics belong to the network; the gateway only brokers
//! the exchange.

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::AppState;
use crate::gateway::setup_network;
use crate::types::{Result, WicketError};

/// Fields every ledger call carries, beyond the routing tag. Remaining body
/// fields are forwarded untouched inside the raw body value.
#[derive(Debug, Clone, Deserialize)]
pub struct CallRequest {
    /// Caller identity; selects the credential set
    pub username: String,
    /// Logical channel to operate on
    pub channel: String,
    /// Chaincode function to run
    #[serde(rename = "functionName")]
    pub function_name: String,
    /// Positional string arguments, forwarded verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

impl CallRequest {
    fn from_body(body: &Value) -> Result<Self> {
        serde_json::from_value(body.clone())
            .map_err(|e| WicketError::Dispatch(format!("invalid call request: {e}")))
    }
}

/// Read-only query path: evaluate on the channel, no ordering.
pub async fn query(
    state: &AppState,
    _event: &ApiGatewayProxyRequest,
    body: &Value,
) -> Result<Value> {
    let request = CallRequest::from_body(body)?;

    debug!(
        username = %request.username,
        channel = %request.channel,
        function = %request.function_name,
        "Query path selected"
    );

    let channel = setup_network(
        state.resolver.as_ref(),
        &state.config,
        state.connector.as_ref(),
        &request.username,
        &request.channel,
    )
    .await?;

    let payload = channel
        .evaluate(&request.function_name, &request.args)
        .await?;

    Ok(payload_to_value(payload))
}

/// Transaction-submission path: submit for ordering, commit wait bounded by
/// the session options.
pub async fn invoke(
    state: &AppState,
    _event: &ApiGatewayProxyRequest,
    body: &Value,
) -> Result<Value> {
    let request = CallRequest::from_body(body)?;

    info!(
        username = %request.username,
        channel = %request.channel,
        function = %request.function_name,
        "Invoke path selected"
    );

    let channel = setup_network(
        state.resolver.as_ref(),
        &state.config,
        state.connector.as_ref(),
        &request.username,
        &request.channel,
    )
    .await?;

    let payload = channel
        .submit(&request.function_name, &request.args)
        .await?;

    Ok(payload_to_value(payload))
}

/// Peer payloads are commonly JSON; anything else is surfaced as a string.
fn payload_to_value(payload: Vec<u8>) -> Value {
    match serde_json::from_slice::<Value>(&payload) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(&payload).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_request_parses_alongside_routing_tag() {
        let body = json!({
            "functionType": "query",
            "username": "alice",
            "channel": "assets",
            "functionName": "Accounts",
            "args": ["Org1"]
        });
        let request = CallRequest::from_body(&body).unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.channel, "assets");
        assert_eq!(request.function_name, "Accounts");
        assert_eq!(request.args, vec!["Org1"]);
    }

    #[test]
    fn test_args_default_to_empty() {
        let body = json!({
            "username": "alice",
            "channel": "assets",
            "functionName": "Assets"
        });
        let request = CallRequest::from_body(&body).unwrap();
        assert!(request.args.is_empty());
    }

    #[test]
    fn test_missing_username_is_dispatch_error() {
        let body = json!({ "channel": "assets", "functionName": "Assets" });
        assert!(matches!(
            CallRequest::from_body(&body),
            Err(WicketError::Dispatch(_))
        ));
    }

    #[test]
    fn test_payload_to_value_prefers_json() {
        assert_eq!(
            payload_to_value(b"{\"count\":2}".to_vec()),
            json!({"count": 2})
        );
        assert_eq!(
            payload_to_value(b"plain text".to_vec()),
            Value::String("plain text".to_string())
        );
    }
}
