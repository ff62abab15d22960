//! In-memory tail of WARN/ERROR log lines, served by the HTTP API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const DIAGNOSTICS_CAPACITY: usize = 200;

#[derive(Clone, Default)]
pub struct Diagnostics {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl Diagnostics {
    pub fn push(&self, line: String) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        if lines.len() == DIAGNOSTICS_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn recent(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// A tracing layer that copies WARN and ERROR events into [`Diagnostics`].
pub struct DiagnosticsLayer {
    sink: Diagnostics,
}

impl DiagnosticsLayer {
    pub fn new(sink: Diagnostics) -> Self {
        Self { sink }
    }
}

impl<S> tracing_subscriber::Layer<S> for DiagnosticsLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = event.metadata().level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        self.sink.push(message);
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}
