//! Test utilities for srcdeps
//!
//! Logging setup and in-memory doubles for the collaborators of the
//! [`BuildCoordinator`](crate::coordinator::BuildCoordinator). Available to unit
//! tests and, through the `test-utils` feature, to integration tests.

mod doubles;

pub use doubles::{CountingDirectories, FakeBuildService, InMemoryStore, StubFinder, sample_repository};

use std::fmt;
use std::sync::{Arc, Mutex, Once};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging based on the `RUST_LOG` environment variable.
///
/// Safe to call from every test; only the first call has an effect. Without an
/// explicit level and without `RUST_LOG`, nothing is logged.
///
/// ```bash
/// RUST_LOG=srcdeps=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A tracing layer that records every event's level and message.
///
/// ```rust,ignore
/// let events = CapturedEvents::new();
/// let _guard = events.set_default();
/// // ... code under test ...
/// assert_eq!(events.count(Level::ERROR, "still not available"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedEvents {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events on the current thread to this recorder until the guard drops.
    ///
    /// Use from a current-thread runtime so every task logs on this thread.
    #[must_use]
    pub fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        tracing_subscriber::registry().with(self.clone()).set_default()
    }

    /// Number of events at `level` whose message contains `needle`.
    #[must_use]
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.messages(level).iter().filter(|message| message.contains(needle)).count()
    }

    /// Messages of all events recorded at `level`.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(event_level, _)| *event_level == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push((*event.metadata().level(), visitor.0));
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
