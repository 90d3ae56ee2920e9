//! OTLP span exporter construction.
//!
//! Builds a tonic/gRPC span exporter configured for a Honeycomb-style
//! collector: TLS transport, the API key as the `x-honeycomb-team` metadata
//! entry, and the dataset as `x-honeycomb-dataset`.

use crate::config::{API_KEY_ENV, TelemetryConfig};
use crate::error::Error;
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use std::collections::HashMap;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};
use tonic::transport::ClientTlsConfig;

/// Metadata key carrying the API key.
pub const TEAM_HEADER: &str = "x-honeycomb-team";

/// Metadata key carrying the dataset name.
pub const DATASET_HEADER: &str = "x-honeycomb-dataset";

/// Builds the OTLP/gRPC span exporter from configuration.
///
/// Construction does not open a connection (the channel connects lazily on
/// first export), but creating the tonic channel requires a tokio runtime
/// context.
///
/// # Errors
///
/// Returns [`Error::MissingApiKey`] if no API key is configured and
/// [`Error::Exporter`] if the underlying exporter cannot be built. Both are
/// fatal startup errors.
pub fn build_span_exporter(config: &TelemetryConfig) -> Result<SpanExporter, Error> {
    let api_key = config
        .exporter
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(Error::MissingApiKey { var: API_KEY_ENV })?;

    let mut headers = config.exporter.headers.clone();
    headers.insert(TEAM_HEADER.to_string(), api_key.to_string());
    headers.insert(
        DATASET_HEADER.to_string(),
        config.exporter.dataset.clone(),
    );

    let mut builder = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.exporter.endpoint)
        .with_timeout(config.exporter.timeout)
        .with_metadata(build_tonic_metadata(&headers));

    if config.exporter.endpoint.starts_with("https://") {
        builder = builder.with_tls_config(ClientTlsConfig::new().with_native_roots());
    }

    builder.build().map_err(Error::Exporter)
}

fn build_tonic_metadata(headers: &HashMap<String, String>) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    for (key, value) in headers {
        if let (Ok(k), Ok(v)) = (
            key.parse::<MetadataKey<_>>(),
            value.parse::<MetadataValue<_>>(),
        ) {
            metadata.insert(k, v);
        }
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExporterConfig;

    #[test]
    fn build_tonic_metadata_parses_valid_headers() {
        let mut headers = HashMap::new();
        headers.insert(TEAM_HEADER.to_string(), "key123".to_string());
        headers.insert(DATASET_HEADER.to_string(), "correlate-this".to_string());

        let metadata = build_tonic_metadata(&headers);

        assert_eq!(metadata.len(), 2);
        assert!(metadata.get(TEAM_HEADER).is_some());
        assert!(metadata.get(DATASET_HEADER).is_some());
    }

    #[test]
    fn build_tonic_metadata_skips_invalid_keys() {
        let mut headers = HashMap::new();
        headers.insert("not a valid key".to_string(), "value".to_string());

        let metadata = build_tonic_metadata(&headers);
        assert_eq!(metadata.len(), 0);
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let config = TelemetryConfig::default();
        let result = build_span_exporter(&config);

        assert!(matches!(
            result,
            Err(Error::MissingApiKey { var }) if var == API_KEY_ENV
        ));
    }

    #[test]
    fn empty_api_key_is_fatal() {
        let config = TelemetryConfig {
            exporter: ExporterConfig {
                api_key: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            build_span_exporter(&config),
            Err(Error::MissingApiKey { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exporter_builds_with_api_key() {
        let config = TelemetryConfig {
            exporter: ExporterConfig {
                api_key: Some("key123".to_string()),
                endpoint: "http://localhost:4317".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(build_span_exporter(&config).is_ok());
    }
}
