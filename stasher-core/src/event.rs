//! The Logstash-compatible event record.
//!
//! One [`Event`] describes one completed request/response cycle. Field names
//! on the wire are fixed: log pipelines key on `@timestamp`, `@version`,
//! `duration`, `xforward` and friends, so the serde renames below are part
//! of the public contract.

use serde::Serialize;
use std::collections::BTreeMap;

/// Value of the `@version` field. Consumers use it to detect schema changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Query parameters: key → values in the order they appeared in the URL.
pub type Params = BTreeMap<String, Vec<String>>;

/// A single request log record, built once per request and never mutated.
///
/// The header-derived fields are `Some` (possibly empty) under the extended
/// schema and `None` under the minimal one, in which case they are left out
/// of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// RFC 3339 timestamp with offset.
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    /// Always [`SCHEMA_VERSION`].
    #[serde(rename = "@version")]
    pub version: u32,
    pub method: String,
    /// URL path without the query string.
    pub path: String,
    pub status: u16,
    /// Declared response `Content-Length`, `0` when missing or malformed.
    pub size: u64,
    /// Time spent in the downstream handler chain, in milliseconds.
    pub duration: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: Params,

    // ── Request headers (extended schema) ─────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request `Content-Length` verbatim, not the response size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// `X-Forwarded-For`.
    #[serde(rename = "xforward", skip_serializing_if = "Option::is_none")]
    pub forwarded_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Event {
    /// True when the header-derived fields were left out.
    pub fn is_minimal(&self) -> bool {
        self.user_agent.is_none()
            && self.content_length.is_none()
            && self.content_type.is_none()
            && self.referer.is_none()
            && self.forwarded_for.is_none()
            && self.origin.is_none()
    }
}
