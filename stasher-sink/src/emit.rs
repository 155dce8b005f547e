use crate::EventSink;
use serde::Serialize;
use stasher_core::StasherError;
use std::fmt::Debug;
use tracing::{error, warn};

/// Serialize `event` into a single JSON line (no trailing newline).
pub fn encode_line<T: Serialize + ?Sized>(event: &T) -> Result<String, StasherError> {
    Ok(serde_json::to_string(event)?)
}

/// Serialize `event` and hand it to `sink`.
///
/// Never fails: a serialization error drops this one event and is reported
/// through `tracing` together with the event itself; a sink error is
/// reported and otherwise ignored. Returns whether a line was written.
pub fn emit<T: Serialize + Debug + ?Sized>(sink: &dyn EventSink, event: &T) -> bool {
    let line = match encode_line(event) {
        Ok(line) => line,
        Err(e) => {
            error!(error = %e, event = ?event, "Unable to serialize request event, dropping it");
            return false;
        }
    };

    match sink.write_line(&line) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to write request event to sink");
            false
        }
    }
}
