//! Request logging middleware producing Logstash-compatible JSON lines.
//!
//! ```rust,ignore
//! use stasher_middleware::logger;
//! use stasher_sink::LineSink;
//!
//! let app = axum::Router::new()
//!     .route("/", axum::routing::get(|| async { "hello" }))
//!     .layer(logger(LineSink::stdout()));
//! ```
//!
//! The layer can wrap a whole router or a single route
//! (`get(handler).layer(...)`); every request that passes through it
//! produces exactly one line on the sink once the inner service returns.

pub mod layer;

pub use layer::{EventLogger, EventLoggerLayer, logger};
