//! Configuration types for the demo service.
//!
//! These types are designed to be deserialised from multiple sources using
//! figment, supporting layered configuration from defaults, files, and
//! environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable holding the Honeycomb API key.
pub const API_KEY_ENV: &str = "HONEYCOMB_API_KEY";

/// Environment variable overriding the Honeycomb dataset.
pub const DATASET_ENV: &str = "HONEYCOMB_DATASET";

/// Complete telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Exporter configuration.
    pub exporter: ExporterConfig,

    /// Resource configuration.
    pub resource: ResourceConfig,

    /// Batch export configuration.
    pub batch: BatchConfig,

    /// Whether to initialise the tracing subscriber.
    pub init_tracing_subscriber: bool,

    /// Name for the instrumentation scope (otel.library.name).
    /// Defaults to `service_name` if set, otherwise "hello-instrumented".
    pub instrumentation_scope_name: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            exporter: ExporterConfig::default(),
            resource: ResourceConfig::default(),
            batch: BatchConfig::default(),
            init_tracing_subscriber: true,
            instrumentation_scope_name: None,
        }
    }
}

impl TelemetryConfig {
    /// Returns the instrumentation scope name, falling back to the service
    /// name and then the crate name.
    #[must_use]
    pub fn scope_name(&self) -> String {
        self.instrumentation_scope_name
            .clone()
            .or_else(|| self.resource.service_name.clone())
            .unwrap_or_else(|| "hello-instrumented".to_string())
    }
}

/// OTLP/gRPC exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Collector endpoint URL.
    pub endpoint: String,

    /// API key sent as the `x-honeycomb-team` metadata entry.
    ///
    /// Usually layered in from the `HONEYCOMB_API_KEY` environment variable
    /// via [`TelemetryBuilder::with_honeycomb_env`](crate::TelemetryBuilder::with_honeycomb_env).
    pub api_key: Option<String>,

    /// Dataset name sent as the `x-honeycomb-dataset` metadata entry.
    pub dataset: String,

    /// Export request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Additional metadata entries attached to every export request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.honeycomb.io:443".to_string(),
            api_key: None,
            dataset: "correlate-this".to_string(),
            timeout: Duration::from_secs(10),
            headers: HashMap::new(),
        }
    }
}

/// Resource configuration: static identity of the process producing spans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Service name. Required by most backends; Honeycomb uses it as the
    /// service dataset where trace data is stored.
    pub service_name: Option<String>,

    /// Service version.
    pub service_version: Option<String>,

    /// Additional resource attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ResourceConfig {
    /// Creates a new resource config with a service name.
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Batch span processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum queue size.
    pub max_queue_size: usize,

    /// Maximum batch size for export.
    pub max_export_batch_size: usize,

    /// Scheduled delay between exports.
    ///
    /// The export request itself is bounded by
    /// [`ExporterConfig::timeout`].
    #[serde(with = "humantime_serde")]
    pub scheduled_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_secs(5),
        }
    }
}

/// Configuration for the demo HTTP application itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    pub listen: SocketAddr,

    /// One-in-N chance that a request fails with a 500. Zero disables
    /// failure injection.
    pub failure_one_in: u32,

    /// How long the mock `sleep` operation takes.
    #[serde(with = "humantime_serde")]
    pub work_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3030)),
            failure_one_in: 5,
            work_delay: Duration::from_secs(1),
        }
    }
}

impl AppConfig {
    /// Loads the app configuration from defaults merged with `HELLO_`
    /// prefixed environment variables.
    ///
    /// For example `HELLO_LISTEN=127.0.0.1:8080` or `HELLO_WORK_DELAY=50ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails (e.g. a malformed duration).
    pub fn load() -> Result<Self, crate::Error> {
        use figment::Figment;
        use figment::providers::{Env, Serialized};

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Env::prefixed("HELLO_"))
            .extract()
            .map_err(|e| crate::Error::Config(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_config_defaults() {
        let config = ExporterConfig::default();
        assert_eq!(config.endpoint, "https://api.honeycomb.io:443");
        assert_eq!(config.dataset, "correlate-this");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.api_key.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_scope_name_falls_back_to_service_name() {
        let mut config = TelemetryConfig::default();
        assert_eq!(config.scope_name(), "hello-instrumented");

        config.resource.service_name = Some("my-service".to_string());
        assert_eq!(config.scope_name(), "my-service");

        config.instrumentation_scope_name = Some("my-scope".to_string());
        assert_eq!(config.scope_name(), "my-scope");
    }

    #[test]
    fn test_resource_config_with_service_name() {
        let config = ResourceConfig::with_service_name("my-service");
        assert_eq!(config.service_name, Some("my-service".to_string()));
    }

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.max_queue_size, 2048);
        assert_eq!(config.max_export_batch_size, 512);
        assert_eq!(config.scheduled_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listen, SocketAddr::from(([0, 0, 0, 0], 3030)));
        assert_eq!(config.failure_one_in, 5);
        assert_eq!(config.work_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_app_config_env_overrides() {
        temp_env::with_vars(
            [
                ("HELLO_LISTEN", Some("127.0.0.1:8080")),
                ("HELLO_FAILURE_ONE_IN", Some("10")),
                ("HELLO_WORK_DELAY", Some("250ms")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.listen, SocketAddr::from(([127, 0, 0, 1], 8080)));
                assert_eq!(config.failure_one_in, 10);
                assert_eq!(config.work_delay, Duration::from_millis(250));
            },
        );
    }
}
