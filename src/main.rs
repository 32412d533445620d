//! Wicket - serverless gateway for a permissioned ledger network
//!
//! "A small gate set into a larger one"

use std::sync::Arc;

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use clap::Parser;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wicket::{config::Args, dispatch, gateway::PeerConnector, secrets::SsmResolver, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wicket={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Wicket - Ledger Network Gateway");
    info!("======================================");
    info!("Secrets prefix: {}", args.secrets_prefix);
    info!(
        "Connection profile: {}",
        if args.profile_encoded.is_some() {
            "provided"
        } else {
            "NOT PROVIDED (requests will fail)"
        }
    );
    info!("Commit timeout: {}ms", args.commit_timeout_ms);
    info!("======================================");

    // Collaborators are built once per container; wallets and sessions are
    // per-invocation values.
    let resolver = Arc::new(SsmResolver::from_env().await);
    let connector = Arc::new(PeerConnector::new());
    let state = Arc::new(AppState::new(args, resolver, connector));

    run(service_fn(
        move |event: LambdaEvent<ApiGatewayProxyRequest>| {
            let state = Arc::clone(&state);
            async move { Ok::<_, Error>(dispatch::handle(&state, event.payload).await) }
        },
    ))
    .await
    .map_err(|e| anyhow::anyhow!("runtime error: {e}"))
}
