#![forbid(unsafe_code)]

//! Test fixtures for scrim.
//!
//! - [`CallLog`]: records close-handler invocations in call order.
//! - [`CompletionProbe`]: counts how often a close completion ran.
//! - [`ModalHost`]: a stand-in for the UI layer that owns modals, closes
//!   them on request, and reports when the last close transition finished.
//! - [`LogCapture`]: a `tracing` layer that keeps emitted events for
//!   assertions.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};

use scrim_modal::{CloseHandlerGuard, ModalCoordinator};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// ============================================================================
// CallLog
// ============================================================================

/// One close-handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub modal: &'static str,
    pub is_navigating: bool,
}

/// Shared, ordered record of close-handler invocations.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A close handler that appends `modal` to this log when called.
    pub fn handler(&self, modal: &'static str) -> impl Fn(bool) + 'static {
        let calls = Rc::clone(&self.calls);
        move |is_navigating| {
            calls.borrow_mut().push(Call {
                modal,
                is_navigating,
            });
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Modal names in call order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|c| c.modal).collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

// ============================================================================
// CompletionProbe
// ============================================================================

/// Counts invocations of the completions it hands out.
#[derive(Debug, Clone, Default)]
pub struct CompletionProbe {
    hits: Rc<Cell<u32>>,
}

impl CompletionProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A completion that bumps this probe's count.
    pub fn completion(&self) -> impl FnOnce() + 'static {
        let hits = Rc::clone(&self.hits);
        move || hits.set(hits.get() + 1)
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.hits.get()
    }
}

// ============================================================================
// ModalHost
// ============================================================================

/// Where a hosted modal is in its transition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    /// Open transition running (alert modals only).
    Opening,
    Open,
    /// Close requested, close transition running.
    Closing,
}

struct HostedModal {
    name: &'static str,
    phase: ModalPhase,
    /// Alert whose open transition has not finished.
    alert_pending: bool,
    last_close_navigating: Option<bool>,
    _guard: CloseHandlerGuard,
}

/// Simulated UI layer owning a set of modals.
///
/// Each opened modal registers a close handler that starts its close
/// transition. [`finish_transitions`](Self::finish_transitions) completes
/// every running transition; once the last modal is gone it publishes
/// `is_visible = false` and calls
/// [`ModalCoordinator::on_modal_did_close`].
pub struct ModalHost {
    coordinator: ModalCoordinator,
    modals: Rc<RefCell<Vec<HostedModal>>>,
}

impl ModalHost {
    #[must_use]
    pub fn new(coordinator: ModalCoordinator) -> Self {
        Self {
            coordinator,
            modals: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Mount a regular modal; it is visible immediately.
    pub fn open(&self, name: &'static str) {
        self.mount(name, false);
        self.coordinator.publish_visibility(true);
    }

    /// Mount an alert modal; it becomes visible after
    /// [`finish_transitions`](Self::finish_transitions).
    pub fn open_alert(&self, name: &'static str) {
        self.mount(name, true);
        self.coordinator.publish_alert_pending(true);
    }

    fn mount(&self, name: &'static str, alert: bool) {
        let modals: Weak<RefCell<Vec<HostedModal>>> = Rc::downgrade(&self.modals);
        let guard = self
            .coordinator
            .register(move |is_navigating| {
                let Some(modals) = modals.upgrade() else {
                    return;
                };
                if let Some(m) = modals.borrow_mut().iter_mut().find(|m| m.name == name) {
                    m.phase = ModalPhase::Closing;
                    m.last_close_navigating = Some(is_navigating);
                }
            })
            .into_guard();
        self.modals.borrow_mut().push(HostedModal {
            name,
            phase: if alert {
                ModalPhase::Opening
            } else {
                ModalPhase::Open
            },
            alert_pending: alert,
            last_close_navigating: None,
            _guard: guard,
        });
    }

    /// Finish every running open and close transition.
    pub fn finish_transitions(&self) {
        let (opened_alert, closed, now_empty) = {
            let mut modals = self.modals.borrow_mut();
            let mut opened_alert = false;
            for m in modals.iter_mut().filter(|m| m.phase == ModalPhase::Opening) {
                m.phase = ModalPhase::Open;
                opened_alert |= m.alert_pending;
                m.alert_pending = false;
            }
            let before = modals.len();
            let closed: Vec<HostedModal> = {
                let (gone, kept): (Vec<_>, Vec<_>) = modals
                    .drain(..)
                    .partition(|m| m.phase == ModalPhase::Closing);
                *modals = kept;
                gone
            };
            let now_empty = before > 0 && modals.is_empty();
            (opened_alert, closed, now_empty)
        };
        // Guards unregister here, outside the host borrow.
        let any_closed = !closed.is_empty();
        let abandoned_alert = closed.iter().any(|m| m.alert_pending);
        drop(closed);

        if opened_alert {
            self.coordinator.publish_alert_pending(false);
            self.coordinator.publish_visibility(true);
        } else if abandoned_alert {
            self.coordinator.publish_alert_pending(false);
        }
        if any_closed && now_empty {
            self.coordinator.publish_visibility(false);
            self.coordinator.on_modal_did_close();
        }
    }

    /// Transition phase of the modal named `name`, if mounted.
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<ModalPhase> {
        self.modals
            .borrow()
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.phase)
    }

    /// `is_navigating` from the last close request a modal received.
    #[must_use]
    pub fn close_navigating(&self, name: &str) -> Option<bool> {
        self.modals
            .borrow()
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.last_close_navigating)
    }

    /// Number of mounted modals, including ones mid-transition.
    #[must_use]
    pub fn mounted(&self) -> usize {
        self.modals.borrow().len()
    }
}

impl fmt::Debug for ModalHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modals = self.modals.borrow();
        f.debug_struct("ModalHost")
            .field(
                "modals",
                &modals.iter().map(|m| (m.name, m.phase)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// LogCapture
// ============================================================================

/// A `tracing` event kept by [`LogCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// `tracing` layer that stores every event it sees.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this capture installed as the thread's default
    /// subscriber.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events at `level` whose message contains `needle`.
    #[must_use]
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .count()
    }

    /// Events at any level whose message contains `needle`.
    #[must_use]
    pub fn count_any(&self, needle: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.message.contains(needle))
            .count()
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_log_records_in_order() {
        let log = CallLog::new();
        let a = log.handler("a");
        let b = log.handler("b");
        b(true);
        a(false);
        assert_eq!(log.names(), vec!["b", "a"]);
        assert_eq!(
            log.calls()[1],
            Call {
                modal: "a",
                is_navigating: false
            }
        );
        log.clear();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn probe_counts_completions() {
        let probe = CompletionProbe::new();
        (probe.completion())();
        (probe.completion())();
        assert_eq!(probe.count(), 2);
    }

    #[test]
    fn capture_sees_events() {
        let capture = LogCapture::new();
        capture.run(|| tracing::warn!("modal stuck"));
        assert_eq!(capture.count(Level::WARN, "stuck"), 1);
        assert_eq!(capture.count(Level::DEBUG, "stuck"), 0);
    }

    #[test]
    fn host_tracks_phases() {
        let host = ModalHost::new(ModalCoordinator::new());
        host.open("settings");
        assert_eq!(host.phase("settings"), Some(ModalPhase::Open));
        assert_eq!(host.phase("missing"), None);
        assert_eq!(host.mounted(), 1);
    }
}
