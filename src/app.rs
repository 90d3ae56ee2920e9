//! The instrumented HTTP application.
//!
//! One route, one handler. Each request gets a root server span, parented
//! to the remote trace context if the caller sent one; the three mock
//! business operations each record a child span with an attribute, and a
//! failure policy decides whether the request is answered with a 500.
//!
//! Spans are created through the tracer carried in [`AppState`] rather than
//! the process-global tracer, and every span is closed on drop, so no exit
//! path can leak one.

use crate::failure::FailurePolicy;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use opentelemetry::global;
use opentelemetry::trace::{Span, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::trace::SdkTracer;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Path of the single instrumented route.
pub const ROUTE: &str = "/hello-instrumented";

/// Body returned on success.
pub const GREETING: &str = "Hello, World! I am instrumented automatically!";

/// Shared state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    tracer: SdkTracer,
    failure: Arc<dyn FailurePolicy>,
    work_delay: Duration,
}

impl AppState {
    /// Creates the application state.
    pub fn new(tracer: SdkTracer, failure: Arc<dyn FailurePolicy>, work_delay: Duration) -> Self {
        Self {
            tracer,
            failure,
            work_delay,
        }
    }
}

/// Builds the router with the single instrumented route.
///
/// The route accepts any method, matching the original demo's behaviour.
pub fn router(state: AppState) -> Router {
    Router::new().route(ROUTE, any(hello_handler)).with_state(state)
}

/// Handles one request: root span, three child operations, failure roll.
///
/// The root span is parented to the trace context extracted from the
/// request headers, so traces started by an upstream caller continue here.
/// Requests without a `traceparent` header start a fresh trace.
async fn hello_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let parent_cx = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(&headers))
    });

    let root = state
        .tracer
        .span_builder("hello-instrumented")
        .with_kind(SpanKind::Server)
        .start_with_context(&state.tracer, &parent_cx);
    let cx = parent_cx.with_span(root);

    get_user(&state.tracer, &cx);
    get_order(&state.tracer, &cx);
    sleepy(&state.tracer, &cx, state.work_delay).await;

    let failed = state.failure.should_fail();
    {
        let span = cx.span();
        if failed {
            span.set_status(Status::error("injected failure"));
        }
        span.end();
    }

    if failed {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    } else {
        GREETING.into_response()
    }
}

/// Emulates fetching a user from the database.
fn get_user(tracer: &SdkTracer, cx: &Context) {
    let mut span = tracer.start_with_context("getUser", cx);

    let id: i64 = rand::thread_rng().gen_range(1..=10);

    span.set_attribute(KeyValue::new("user", id));
}

/// Emulates fetching an order from the database.
fn get_order(tracer: &SdkTracer, cx: &Context) {
    let mut span = tracer.start_with_context("getOrder", cx);

    let id = Uuid::new_v4().to_string();

    span.set_attribute(KeyValue::new("order", id));
}

/// Mocks work the application does.
async fn sleepy(tracer: &SdkTracer, cx: &Context, delay: Duration) {
    let mut span = tracer.start_with_context("sleep", cx);

    tokio::time::sleep(delay).await;

    span.set_attribute(KeyValue::new("sleep.duration_ms", delay.as_millis() as i64));
}
