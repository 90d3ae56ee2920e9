//! Tracer provider lifecycle management.
//!
//! The [`TelemetryGuard`] owns the tracer provider for the life of the
//! process. It installs the provider as the process-wide default, configures
//! context propagation, and on shutdown (or drop) flushes pending spans and
//! shuts the provider down exactly once.

use crate::config::TelemetryConfig;
use crate::error::Error;
use crate::exporter::build_span_exporter;
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{
    BatchConfigBuilder, BatchSpanProcessor, SdkTracer, SdkTracerProvider,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Guard that manages the tracer provider lifecycle.
///
/// On drop, flushes pending spans and shuts the provider down.
/// Use [`shutdown()`](Self::shutdown) for explicit error handling;
/// calling it more than once is harmless.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    tracer: SdkTracer,
}

impl TelemetryGuard {
    /// Creates a TelemetryGuard from configuration.
    ///
    /// This is typically called by
    /// [`TelemetryBuilder::build`](crate::TelemetryBuilder::build).
    pub(crate) fn from_config(config: TelemetryConfig) -> Result<Self, Error> {
        let exporter = build_span_exporter(&config)?;

        let batch_config = BatchConfigBuilder::default()
            .with_max_queue_size(config.batch.max_queue_size)
            .with_max_export_batch_size(config.batch.max_export_batch_size)
            .with_scheduled_delay(config.batch.scheduled_delay)
            .build();

        let span_processor = BatchSpanProcessor::builder(exporter)
            .with_batch_config(batch_config)
            .build();

        let tracer_provider = SdkTracerProvider::builder()
            .with_span_processor(span_processor)
            .with_resource(build_resource(&config))
            .build();

        opentelemetry::global::set_tracer_provider(tracer_provider.clone());

        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);
        opentelemetry::global::set_text_map_propagator(propagator);

        if config.init_tracing_subscriber {
            init_subscriber()?;
        }

        let tracer = tracer_provider.tracer(config.scope_name());

        Ok(Self {
            tracer_provider: Some(tracer_provider),
            tracer,
        })
    }

    /// Returns the tracer provider, if not yet shut down.
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    /// Returns a tracer for instrumenting application code.
    ///
    /// The tracer is handed to instrumented code explicitly rather than
    /// looked up through process globals, so tests can substitute their own
    /// provider.
    pub fn tracer(&self) -> SdkTracer {
        self.tracer.clone()
    }

    /// Flushes pending spans. Errors are logged but not returned.
    pub fn flush(&self) {
        if let Some(provider) = &self.tracer_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: "telemetry_lifecycle", error = %e, "Failed to flush tracer provider");
        }
    }

    /// Flushes pending spans and shuts the provider down.
    ///
    /// Idempotent: the second and subsequent calls do nothing and return
    /// `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the first flush or shutdown error from the provider.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        if let Some(provider) = self.tracer_provider.take() {
            provider.force_flush().map_err(Error::Flush)?;
            provider.shutdown().map_err(Error::Shutdown)?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: "telemetry_lifecycle", error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}

fn build_resource(config: &TelemetryConfig) -> Resource {
    let mut attributes: Vec<KeyValue> = config
        .resource
        .attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();

    if let Some(name) = &config.resource.service_name {
        attributes.push(KeyValue::new("service.name", name.clone()));
    }

    if let Some(version) = &config.resource.service_version {
        attributes.push(KeyValue::new("service.version", version.clone()));
    }

    Resource::builder().with_attributes(attributes).build()
}

fn init_subscriber() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use std::collections::HashMap;

    #[test]
    fn build_resource_includes_service_name() {
        let config = TelemetryConfig {
            resource: ResourceConfig::with_service_name("my-test-service"),
            ..Default::default()
        };

        let resource = build_resource(&config);

        let service_name = resource
            .iter()
            .find(|(k, _)| k.as_str() == "service.name")
            .map(|(_, v)| v.to_string());
        assert_eq!(service_name.as_deref(), Some("my-test-service"));
    }

    #[test]
    fn build_resource_includes_custom_attributes() {
        let mut attributes = HashMap::new();
        attributes.insert("custom.key".to_string(), "custom-value".to_string());

        let config = TelemetryConfig {
            resource: ResourceConfig {
                attributes,
                ..Default::default()
            },
            ..Default::default()
        };

        let resource = build_resource(&config);

        let custom_attr = resource
            .iter()
            .find(|(k, _)| k.as_str() == "custom.key")
            .map(|(_, v)| v.to_string());
        assert_eq!(custom_attr.as_deref(), Some("custom-value"));
    }
}
