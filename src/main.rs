//! Entry point: configure telemetry, build the app, serve until shutdown.

use hello_instrumented::{
    AppConfig, AppState, Error, RandomFailure, TelemetryBuilder, router, server,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let app_config = AppConfig::load()?;

    let mut guard = TelemetryBuilder::new()
        .with_honeycomb_env()
        .with_env("TELEMETRY_")
        .service_name("hello-instrumented")
        .service_version(env!("CARGO_PKG_VERSION"))
        .build()?;

    let state = AppState::new(
        guard.tracer(),
        Arc::new(RandomFailure::new(app_config.failure_one_in)),
        app_config.work_delay,
    );

    server::serve(app_config.listen, router(state)).await?;

    // Flush pending spans before the process exits.
    guard.shutdown()?;
    Ok(())
}
