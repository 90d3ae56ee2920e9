//! Builder for telemetry configuration.
//!
//! The builder supports layered configuration from multiple sources:
//! 1. Compiled defaults (Honeycomb gRPC endpoint, default dataset)
//! 2. Configuration files (TOML)
//! 3. Environment variables
//! 4. Programmatic overrides
//!
//! Sources are merged in order, with later sources taking precedence.

use crate::config::{API_KEY_ENV, DATASET_ENV, TelemetryConfig};
use crate::error::Error;
use crate::guard::TelemetryGuard;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::Path;

/// Builder for configuring and initialising span export.
///
/// # Example
///
/// ```no_run
/// use hello_instrumented::{Error, TelemetryBuilder};
///
/// fn main() -> Result<(), Error> {
///     let mut guard = TelemetryBuilder::new()
///         .with_honeycomb_env()
///         .service_name("hello-instrumented")
///         .build()?;
///
///     // ... run the application ...
///
///     guard.shutdown()?;
///     Ok(())
/// }
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct TelemetryBuilder {
    figment: Figment,
}

impl TelemetryBuilder {
    /// Creates a new builder with default configuration.
    ///
    /// Defaults include:
    /// - Endpoint: `https://api.honeycomb.io:443` (OTLP over gRPC)
    /// - Dataset: `correlate-this`
    /// - Batch export with the SDK's stock queue and delay settings
    /// - Tracing subscriber initialisation enabled
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(TelemetryConfig::default())),
        }
    }

    /// Creates a builder from an existing figment.
    ///
    /// This allows power users to construct complex configuration chains
    /// before passing them to the builder.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// Merges configuration from a TOML file.
    ///
    /// If the file doesn't exist, it's silently skipped. This allows
    /// optional configuration files that may or may not be present.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.figment = self.figment.merge(Toml::file(path));
        }
        self
    }

    /// Merges configuration from environment variables with the given prefix.
    ///
    /// Environment variables are split on every underscore to address nested
    /// config, so only single-word field names are reachable this way. For
    /// example, with prefix `TELEMETRY_`:
    /// - `TELEMETRY_EXPORTER_ENDPOINT` → `exporter.endpoint`
    /// - `TELEMETRY_EXPORTER_DATASET` → `exporter.dataset`
    ///
    /// Multi-word fields like `resource.service_name` have dedicated setters
    /// instead.
    pub fn with_env(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(prefix).split("_"));
        self
    }

    /// Merges configuration from the conventional Honeycomb environment
    /// variables.
    ///
    /// - `HONEYCOMB_API_KEY` → API key (`x-honeycomb-team`)
    /// - `HONEYCOMB_DATASET` → dataset (`x-honeycomb-dataset`)
    pub fn with_honeycomb_env(mut self) -> Self {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            self.figment = self
                .figment
                .merge(Serialized::default("exporter.api_key", api_key));
        }

        if let Ok(dataset) = std::env::var(DATASET_ENV) {
            self.figment = self
                .figment
                .merge(Serialized::default("exporter.dataset", dataset));
        }

        self
    }

    /// Sets the collector endpoint URL explicitly.
    ///
    /// This overrides any configuration from files or environment variables.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("exporter.endpoint", url.into()));
        self
    }

    /// Sets the API key explicitly.
    ///
    /// Usually the key comes from the environment via
    /// [`with_honeycomb_env`](Self::with_honeycomb_env) instead.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("exporter.api_key", key.into()));
        self
    }

    /// Sets the dataset name.
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("exporter.dataset", dataset.into()));
        self
    }

    /// Sets the service name resource attribute.
    ///
    /// This identifies the service in the telemetry backend; Honeycomb
    /// stores trace data under it.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("resource.service_name", name.into()));
        self
    }

    /// Sets the service version resource attribute.
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "resource.service_version",
            version.into(),
        ));
        self
    }

    /// Adds a metadata entry to all export requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let header_key = format!("exporter.headers.{}", key.into());
        self.figment = self
            .figment
            .merge(Serialized::default(&header_key, value.into()));
        self
    }

    /// Sets the instrumentation scope name (otel.library.name).
    ///
    /// If not set, defaults to the service name, then "hello-instrumented".
    pub fn instrumentation_scope_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "instrumentation_scope_name",
            name.into(),
        ));
        self
    }

    /// Disables automatic tracing subscriber initialisation.
    ///
    /// By default the builder sets up a `tracing-subscriber` registry with
    /// an `EnvFilter` and fmt layer. Disable this if you want to configure
    /// the subscriber yourself (or already have one, as tests do).
    pub fn without_tracing_subscriber(mut self) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("init_tracing_subscriber", false));
        self
    }

    /// Extracts the configuration for inspection or debugging.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails or if the endpoint
    /// URL is invalid.
    pub fn extract_config(&self) -> Result<TelemetryConfig, Error> {
        let config: TelemetryConfig = self
            .figment
            .extract()
            .map_err(|e| Error::Config(Box::new(e)))?;

        let url = &config.exporter.endpoint;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidEndpoint { url: url.clone() });
        }

        Ok(config)
    }

    /// Builds the exporter and tracer provider and installs them.
    ///
    /// Returns a [`TelemetryGuard`] that manages provider lifecycle. When
    /// the guard is dropped, pending spans are flushed and the provider is
    /// shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration extraction fails
    /// - No API key is configured
    /// - The exporter cannot be built
    /// - Tracing subscriber initialisation fails
    pub fn build(self) -> Result<TelemetryGuard, Error> {
        let config = self.extract_config()?;
        TelemetryGuard::from_config(config)
    }
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = TelemetryBuilder::new();
        let config = builder.extract_config().unwrap();

        assert_eq!(config.exporter.endpoint, "https://api.honeycomb.io:443");
        assert_eq!(config.exporter.dataset, "correlate-this");
        assert!(config.init_tracing_subscriber);
    }

    #[test]
    fn test_builder_endpoint() {
        let builder = TelemetryBuilder::new().endpoint("http://collector:4317");
        let config = builder.extract_config().unwrap();

        assert_eq!(config.exporter.endpoint, "http://collector:4317");
    }

    #[test]
    fn test_builder_service_name() {
        let builder = TelemetryBuilder::new().service_name("my-service");
        let config = builder.extract_config().unwrap();

        assert_eq!(config.resource.service_name, Some("my-service".to_string()));
    }

    #[test]
    fn test_builder_api_key_and_dataset() {
        let builder = TelemetryBuilder::new().api_key("key123").dataset("prod");
        let config = builder.extract_config().unwrap();

        assert_eq!(config.exporter.api_key, Some("key123".to_string()));
        assert_eq!(config.exporter.dataset, "prod");
    }

    #[test]
    fn test_builder_header() {
        let builder = TelemetryBuilder::new().header("x-custom", "value");
        let config = builder.extract_config().unwrap();

        assert_eq!(
            config.exporter.headers.get("x-custom"),
            Some(&"value".to_string())
        );
    }

    #[test]
    fn test_builder_without_tracing_subscriber() {
        let builder = TelemetryBuilder::new().without_tracing_subscriber();
        let config = builder.extract_config().unwrap();

        assert!(!config.init_tracing_subscriber);
    }

    #[test]
    fn test_with_honeycomb_env_api_key() {
        temp_env::with_var(API_KEY_ENV, Some("env-key"), || {
            let builder = TelemetryBuilder::new().with_honeycomb_env();
            let config = builder.extract_config().unwrap();
            assert_eq!(config.exporter.api_key, Some("env-key".to_string()));
        });
    }

    #[test]
    fn test_with_honeycomb_env_dataset() {
        temp_env::with_var(DATASET_ENV, Some("env-dataset"), || {
            let builder = TelemetryBuilder::new().with_honeycomb_env();
            let config = builder.extract_config().unwrap();
            assert_eq!(config.exporter.dataset, "env-dataset");
        });
    }

    #[test]
    fn test_programmatic_overrides_env() {
        temp_env::with_vars(
            [
                (API_KEY_ENV, Some("env-key")),
                (DATASET_ENV, Some("env-dataset")),
            ],
            || {
                let builder = TelemetryBuilder::new()
                    .with_honeycomb_env()
                    .api_key("programmatic-key")
                    .dataset("programmatic-dataset");
                let config = builder.extract_config().unwrap();

                assert_eq!(
                    config.exporter.api_key,
                    Some("programmatic-key".to_string())
                );
                assert_eq!(config.exporter.dataset, "programmatic-dataset");
            },
        );
    }

    #[test]
    fn test_env_prefix_maps_nested_fields() {
        temp_env::with_var("TELEMETRY_EXPORTER_DATASET", Some("nested"), || {
            let builder = TelemetryBuilder::new().with_env("TELEMETRY_");
            let config = builder.extract_config().unwrap();
            assert_eq!(config.exporter.dataset, "nested");
        });
    }

    #[test]
    fn test_invalid_endpoint_url_rejected() {
        let builder = TelemetryBuilder::new().endpoint("not-a-valid-url");
        let result = builder.extract_config();

        assert!(
            matches!(result, Err(Error::InvalidEndpoint { ref url }) if url == "not-a-valid-url"),
            "Expected InvalidEndpoint error",
        );
    }

    #[test]
    fn test_valid_http_endpoint_accepted() {
        let builder = TelemetryBuilder::new().endpoint("http://localhost:4317");
        let config = builder.extract_config().unwrap();
        assert_eq!(config.exporter.endpoint, "http://localhost:4317");
    }
}
