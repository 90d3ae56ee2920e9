//! Demo HTTP service instrumented with distributed tracing.
//!
//! Wires together an OTLP/gRPC span exporter, a batching tracer provider
//! with guard-managed lifecycle, and a single instrumented handler running
//! three mock business operations. Spans are exported to a Honeycomb-style
//! backend authenticated with an API key from the environment.
//!
//! # Example
//!
//! ```no_run
//! use hello_instrumented::{Error, TelemetryBuilder};
//!
//! fn main() -> Result<(), Error> {
//!     let mut guard = TelemetryBuilder::new()
//!         .with_honeycomb_env()
//!         .service_name("hello-instrumented")
//!         .build()?;
//!
//!     tracing::info!("Application running");
//!
//!     guard.shutdown()?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
mod builder;
pub mod config;
mod error;
pub mod exporter;
pub mod failure;
mod guard;
pub mod server;

pub use app::{AppState, GREETING, ROUTE, router};
pub use builder::TelemetryBuilder;
pub use config::{AppConfig, BatchConfig, ExporterConfig, ResourceConfig, TelemetryConfig};
pub use error::Error;
pub use failure::{FailurePolicy, Never, RandomFailure};
pub use guard::TelemetryGuard;

/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry;
/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry_sdk;
/// Re-exported for version compatibility with this crate's dependencies.
pub use tracing;
