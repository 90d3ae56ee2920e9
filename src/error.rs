//! Error types for startup, telemetry lifecycle, and serving.

use figment::Error as FigmentError;

/// Errors from configuration, telemetry initialisation, and serving.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to extract configuration from sources.
    #[error("configuration error: {0}")]
    Config(#[source] Box<FigmentError>),

    /// No API key was configured for the exporter.
    #[error("missing API key: set the {var} environment variable")]
    MissingApiKey {
        /// Environment variable the key is expected in.
        var: &'static str,
    },

    /// Invalid endpoint URL format.
    #[error("invalid endpoint URL: {url} (must start with http:// or https://)")]
    InvalidEndpoint {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Failed to create the span exporter.
    #[error("failed to create span exporter")]
    Exporter(#[source] opentelemetry_otlp::ExporterBuildError),

    /// Failed to initialise tracing subscriber.
    #[error("failed to initialise tracing subscriber")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Failed to flush the tracer provider.
    #[error("failed to flush tracer provider")]
    Flush(#[source] opentelemetry_sdk::error::OTelSdkError),

    /// Failed to shut down the tracer provider.
    #[error("failed to shut down tracer provider")]
    Shutdown(#[source] opentelemetry_sdk::error::OTelSdkError),

    /// Failed to bind or serve the HTTP listener.
    #[error("HTTP server error")]
    Serve(#[from] std::io::Error),
}
