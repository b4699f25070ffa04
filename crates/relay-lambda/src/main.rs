//! relay-lambda: hosts the relay adapter inside the AWS Lambda runtime.
//!
//! Each Lambda event becomes one `bootstrap` run. A zero exit is reported
//! to Lambda as success with a null response; anything else is returned as
//! the function error.

use std::sync::Arc;

use anyhow::Context as _;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use relay::{InvocationAdapter, RelayConfig};
use serde_json::Value;

fn build_adapter() -> anyhow::Result<InvocationAdapter> {
    let config = RelayConfig::from_env().context("invalid relay configuration")?;
    let adapter = InvocationAdapter::new(config);
    log_config(&adapter);
    Ok(adapter)
}

fn log_config(adapter: &InvocationAdapter) {
    let config = adapter.config();
    tracing::info!(
        bootstrap = %config.bootstrap.display(),
        working_dir = ?config.working_dir,
        "Loaded relay configuration"
    );
}

async fn handle_request(
    adapter: &InvocationAdapter,
    event: LambdaEvent<Value>,
) -> Result<(), Error> {
    let request_id = event.context.request_id.clone();
    tracing::info!(%request_id, "Received invocation");

    match adapter.invoke(&event.payload).await {
        Ok(()) => {
            tracing::info!(%request_id, "Invocation succeeded");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(%request_id, error = %e, "Invocation failed");
            Err(Error::from(e))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    relay::init_tracing();
    relay::install_panic_hook();

    tracing::info!("relay-lambda {}", env!("CARGO_PKG_VERSION"));

    let adapter = Arc::new(build_adapter().map_err(|e| Error::from(format!("{e:#}")))?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let adapter = Arc::clone(&adapter);
        async move { handle_request(&adapter, event).await }
    }))
    .await
}
