pub mod config;
pub mod error;
pub mod event;
pub mod extract;

pub use config::{EventConfig, SchemaVariant, SinkConfig, StasherConfig, TimestampSource};
pub use error::StasherError;
pub use event::{Event, SCHEMA_VERSION};
pub use extract::{RequestSnapshot, ResponseSnapshot, Timing, build_event};
