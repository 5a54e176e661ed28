//! Capture formatted `tracing` output for assertions.
//!
//! Events go through the same `tracing_subscriber::fmt` layer the CLI uses,
//! minus timestamps and ANSI colours, into an in-memory buffer.

use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// All captured output, one formatted event per line.
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// The single line whose message is `message`; panics unless exactly one matches.
    pub fn line(&self, message: &str) -> String {
        let contents = self.contents();
        let lines: Vec<&str> = contents.lines().filter(|l| l.contains(message)).collect();
        assert_eq!(lines.len(), 1, "expected one {:?} event in:\n{}", message, contents);
        lines[0].to_string()
    }

    pub fn count(&self, message: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(message)).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber that records every event.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs)
}
