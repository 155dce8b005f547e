//! Output sinks for serialized events.
//!
//! A sink receives one JSON document per call and is responsible for
//! appending the newline and for keeping each line intact when many
//! requests write at once. What happens to the line afterwards (stdout,
//! file, socket) is the sink's business, not the middleware's.

pub mod emit;
pub mod line;

use stasher_core::StasherError;
use stasher_core::config::{SinkConfig, SinkKind};
use std::io;
use std::sync::Arc;

pub use emit::{emit, encode_line};
pub use line::{LineSink, MemorySink};

/// Destination for event lines.
///
/// Implementations must write `line` followed by `\n` as a single unit:
/// concurrent callers may land in any order, but never inside each other's
/// line.
pub trait EventSink: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Build the sink described by `config`.
pub fn open_sink(config: &SinkConfig) -> Result<Arc<dyn EventSink>, StasherError> {
    let sink: Arc<dyn EventSink> = match config.kind {
        SinkKind::Stdout => Arc::new(LineSink::stdout()),
        SinkKind::Stderr => Arc::new(LineSink::stderr()),
        SinkKind::File => {
            if config.path.as_os_str().is_empty() {
                return Err(StasherError::Config(
                    "sink.path must be set when sink.kind = file".into(),
                ));
            }
            Arc::new(LineSink::append(&config.path)?)
        }
    };
    Ok(sink)
}
