//! Pure extraction of an [`Event`] from request and response metadata.
//!
//! Nothing here touches a clock, a socket or a sink: the middleware takes
//! the snapshots and the timing, and [`build_event`] turns them into the
//! record. That keeps the field mapping testable without a live server.

use crate::config::{EventConfig, SchemaVariant, TimestampSource};
use crate::event::{Event, Params, SCHEMA_VERSION};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use http::header::{AsHeaderName, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use std::time::Duration;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Request metadata captured before the request is handed downstream.
///
/// The inner service consumes the request, so everything the event needs
/// from it is copied out up front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSnapshot {
    pub method: String,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub user_agent: String,
    pub content_length: String,
    pub content_type: String,
    pub referer: String,
    pub forwarded_for: String,
    pub origin: String,
}

impl RequestSnapshot {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            user_agent: header_string(headers, USER_AGENT),
            content_length: header_string(headers, CONTENT_LENGTH),
            content_type: header_string(headers, CONTENT_TYPE),
            referer: header_string(headers, REFERER),
            forwarded_for: header_string(headers, X_FORWARDED_FOR),
            origin: header_string(headers, ORIGIN),
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_parts(request.method(), request.uri(), request.headers())
    }

    /// Query parameters, repeated keys collected in URL order.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(query) = self.query.as_deref() {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        params
    }
}

/// Finalized response metadata, read after the downstream chain returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    /// Declared `Content-Length`; 0 when absent or not an integer.
    pub size: u64,
}

impl ResponseSnapshot {
    pub fn from_parts(status: StatusCode, headers: &HeaderMap) -> Self {
        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        Self {
            status: status.as_u16(),
            size,
        }
    }

    pub fn from_response<B>(response: &Response<B>) -> Self {
        Self::from_parts(response.status(), response.headers())
    }
}

/// Clock readings taken by the middleware around the downstream call.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Wall-clock time when the request entered the middleware.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time after the downstream chain returned.
    pub finished_at: DateTime<Utc>,
    /// Monotonic time spent downstream.
    pub elapsed: Duration,
}

/// Assemble the event for one request/response cycle.
pub fn build_event(
    request: &RequestSnapshot,
    response: &ResponseSnapshot,
    timing: &Timing,
    config: &EventConfig,
) -> Event {
    let instant = match config.timestamp {
        TimestampSource::Completion => timing.finished_at,
        TimestampSource::Arrival => timing.started_at,
    };
    let timestamp = if config.utc {
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        instant
            .with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    };

    let extended = config.schema == SchemaVariant::Extended;
    let header = |value: &String| extended.then(|| value.clone());

    Event {
        timestamp,
        version: SCHEMA_VERSION,
        method: request.method.clone(),
        path: request.path.clone(),
        status: response.status,
        size: response.size,
        duration: timing.elapsed.as_secs_f64() * 1000.0,
        params: request.params(),
        user_agent: header(&request.user_agent),
        content_length: header(&request.content_length),
        content_type: header(&request.content_type),
        referer: header(&request.referer),
        forwarded_for: header(&request.forwarded_for),
        origin: header(&request.origin),
    }
}

fn header_string<K: AsHeaderName>(headers: &HeaderMap, name: K) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}
