/// EKS bootstrap invoker
///
/// A Lambda function that assumes a cluster admin role to generate a
/// kubeconfig for a managed EKS cluster, then runs the install executable
/// shipped alongside the function against that cluster.
mod bootstrap;
mod config;
mod handler;
mod utils;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::BootstrapConfig;
use crate::handler::{handle_bootstrap_event, LambdaResponse};
use crate::utils::command::SystemRunner;

async fn handle_request(event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    // Configuration is resolved per invocation so a misconfigured variable
    // surfaces as an invocation failure rather than an init crash loop.
    let config = BootstrapConfig::from_env()?;
    let runner = SystemRunner;

    let response = handle_bootstrap_event(&config, &event.context.request_id, &runner)?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eks_bootstrap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    lambda_runtime::run(service_fn(handle_request)).await
}
