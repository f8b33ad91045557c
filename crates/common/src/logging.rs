//! Logging setup and an in-memory log sink.
//!
//! Library code logs through `tracing` macros only. Binaries call
//! [`init_logging`] once; tools and tests that need to read log output
//! back attach a [`LogBuffer`] layer.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Install the global subscriber: `RUST_LOG` if set, otherwise `info`
/// (`debug` when verbose). An optional buffer receives a copy of every
/// event it accepts.
pub fn init_logging(verbose: bool, buffer: Option<LogBuffer>) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(buffer)
        .init();
}

/// Shared, cloneable buffer of formatted log lines.
///
/// Lines read `[LEVEL] message key=value ...`. Events more verbose than
/// the minimum level are dropped, as is everything while disabled.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<BufferState>>,
}

#[derive(Debug)]
struct BufferState {
    enabled: bool,
    min_level: Level,
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn new(min_level: Level) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BufferState {
                enabled: true,
                min_level,
                lines: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }

    pub fn set_min_level(&self, level: Level) {
        self.state().min_level = level;
    }

    /// Copy of all buffered lines in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.state().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.state().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().lines.is_empty()
    }

    /// Whether any buffered line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.state().lines.iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.state().lines.clear();
    }

    /// All lines joined with newlines, one trailing newline per line.
    pub fn dump_to_string(&self) -> String {
        let state = self.state();
        let mut out = String::new();
        for line in &state.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl<S: Subscriber> Layer<S> for LogBuffer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        let mut state = self.state();
        // More verbose levels compare greater.
        if !state.enabled || level > state.min_level {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        state.lines.push(format!("[{level}] {}{}", visitor.message, visitor.fields));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
