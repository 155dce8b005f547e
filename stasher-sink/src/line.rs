use crate::EventSink;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Wraps any writer behind a mutex so each line goes out in one piece.
///
/// The line and its newline are assembled first and handed to the writer
/// with a single `write_all`, then flushed. Buffering beyond that is the
/// caller's choice of `W`.
pub struct LineSink<W: Write + Send> {
    inner: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a `Vec<u8>` in tests.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner
            .into_inner()
            .map_err(|_| io::Error::other("sink lock poisoned"))
    }
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl LineSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl LineSink<File> {
    /// Open `path` for appending, creating it and any missing parent
    /// directories. Existing lines are kept.
    pub fn append(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> EventSink for LineSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("sink lock poisoned"))?;
        writer.write_all(&buf)?;
        writer.flush()
    }
}

/// Keeps every line in memory. Handy for tests and for embedding hosts that
/// forward events themselves.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Everything written so far, exactly as a file sink would hold it.
    pub fn contents(&self) -> String {
        self.lines()
            .into_iter()
            .map(|mut line| {
                line.push('\n');
                line
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}

impl EventSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::other("sink lock poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}
