//! Request Dispatcher - functionType routing with annotated errors
//!
//! Parses the inbound invocation payload, selects the query or invoke path
//! by the body's `functionType` tag, and reports the outcome through the
//! platform shapes: the handler's result verbatim on success, a
//! location-annotated error string on failure. A failed invocation never
//! tears the process down.

use std::sync::Arc;

use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Args;
use crate::gateway::LedgerConnector;
use crate::handlers;
use crate::secrets::SecretResolver;
use crate::types::{pin, Result, WicketError};

/// Shared invocation context: configuration plus the external collaborators
/// the pipeline consumes. Built once at cold start; each invocation gets
/// its own wallet and session, never shared state.
pub struct AppState {
    pub config: Args,
    pub resolver: Arc<dyn SecretResolver>,
    pub connector: Arc<dyn LedgerConnector>,
}

impl AppState {
    pub fn new(
        config: Args,
        resolver: Arc<dyn SecretResolver>,
        connector: Arc<dyn LedgerConnector>,
    ) -> Self {
        Self {
            config,
            resolver,
            connector,
        }
    }
}

/// The closed set of operation classes a request may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    /// Read-only ledger evaluation
    Query,
    /// Transaction submission
    Invoke,
}

const FUNCTION_TYPE_HINT: &str =
    "Request body \"functionType\" must be one of \"query\" or \"invoke\"";

/// Handle one invocation.
///
/// Success and failure both exit through the returned response shape; any
/// error reaching this boundary is annotated with a source-location tag
/// first.
pub async fn handle(state: &AppState, event: ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
    match dispatch(state, &event).await {
        Ok(result) => ApiGatewayProxyResponse {
            status_code: 200,
            body: Some(Body::Text(result.to_string())),
            ..Default::default()
        },
        Err(error) => {
            let annotated = format!("{} {error}", pin());
            warn!(error = %annotated, "Invocation failed");
            ApiGatewayProxyResponse {
                status_code: 500,
                body: Some(Body::Text(annotated)),
                ..Default::default()
            }
        }
    }
}

/// Parse the body, select the handler, run it.
async fn dispatch(state: &AppState, event: &ApiGatewayProxyRequest) -> Result<Value> {
    let raw = event
        .body
        .as_deref()
        .ok_or_else(|| WicketError::Dispatch("request has no body".to_string()))?;

    let body: Value = serde_json::from_str(raw)
        .map_err(|e| WicketError::Dispatch(format!("request body is not valid JSON: {e}")))?;

    let function_type = match body.get("functionType") {
        Some(tag) => serde_json::from_value::<FunctionType>(tag.clone())
            .map_err(|_| WicketError::Dispatch(FUNCTION_TYPE_HINT.to_string()))?,
        None => return Err(WicketError::Dispatch(FUNCTION_TYPE_HINT.to_string())),
    };

    debug!(function_type = ?function_type, "Dispatching request");

    match function_type {
        FunctionType::Query => handlers::query(state, event, &body).await,
        FunctionType::Invoke => handlers::invoke(state, event, &body).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type_closed_set() {
        let query: FunctionType = serde_json::from_value(Value::String("query".into())).unwrap();
        assert_eq!(query, FunctionType::Query);

        let invoke: FunctionType = serde_json::from_value(Value::String("invoke".into())).unwrap();
        assert_eq!(invoke, FunctionType::Invoke);

        // Matching is exact: no aliases, no case folding
        assert!(serde_json::from_value::<FunctionType>(Value::String("transfer".into())).is_err());
        assert!(serde_json::from_value::<FunctionType>(Value::String("Query".into())).is_err());
        assert!(serde_json::from_value::<FunctionType>(Value::Null).is_err());
    }
}
