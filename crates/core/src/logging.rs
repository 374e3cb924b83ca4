use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use std::time::Duration;
use tracing::Level;
use tracing::span::Span;

// NOTE: Tracing is decoupled into two parts:
//
//  * In `server/mod.rs` we install `tower_http::trace::TraceLayer` with the hooks below, which
//    define *what* gets put into a request span and which events are emitted.
//  * Independently, the binary decides *where* these events go by installing a subscriber, e.g.
//    a stderr fmt layer filtered on `EVENT_TARGET`.

const SPAN_NAME: &str = "http_span";
pub const EVENT_TARGET: &str = "http_target";
pub(crate) const LEVEL: Level = Level::INFO;

fn get_header<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
  return headers.get(key).and_then(|value| value.to_str().ok());
}

pub(super) fn make_span(request: &Request<Body>) -> Span {
  let headers = request.headers();

  // NOTE: "%" means print using fmt::Display, and "?" means fmt::Debug.
  return tracing::span!(
      target: EVENT_TARGET,
      LEVEL,
      SPAN_NAME,
      method = %request.method(),
      uri = %request.uri(),
      version = ?request.version(),
      host = get_header(headers, "host"),
      user_agent = get_header(headers, "user-agent"),
      // Reserve placeholders that are recorded on response.
      latency_ms = tracing::field::Empty,
      status = tracing::field::Empty,
  );
}

pub(super) fn on_request(_req: &Request<Body>, _span: &Span) {
  // Nothing to add, the request was already unpacked during span creation above.
}

pub(super) fn on_response(response: &Response<Body>, latency: Duration, span: &Span) {
  let latency_ms = as_millis_f64(&latency);
  let status = response.status().as_u16();

  span.record("latency_ms", latency_ms);
  span.record("status", status);

  tracing::event!(
    target: EVENT_TARGET,
    parent: span,
    LEVEL,
    status,
    latency_ms,
    "response"
  );
}

#[inline]
fn as_millis_f64(d: &Duration) -> f64 {
  const NANOS_PER_MILLI: f64 = 1_000_000.0;
  const MILLIS_PER_SEC: u64 = 1_000;

  return (d.as_secs() as f64) * (MILLIS_PER_SEC as f64)
    + (d.subsec_nanos() as f64) / (NANOS_PER_MILLI);
}
