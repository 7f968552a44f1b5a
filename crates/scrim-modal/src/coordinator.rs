#![forbid(unsafe_code)]

//! Close-all coordination for modals owned by independent components.
//!
//! Each component that owns a modal registers a close handler when the modal
//! mounts and unregisters it on teardown. Any other part of the application
//! can then ask every open modal to close at once (logout, navigation away)
//! and hand over one completion to run after the last close transition has
//! finished.
//!
//! # Invariants
//!
//! - Handlers run in reverse registration order, so the innermost modal
//!   closes first.
//! - A broadcast iterates over a snapshot taken when it starts. Handlers
//!   added or removed during the broadcast do not change who is called.
//! - At most one completion is pending. A newer close request replaces it;
//!   the replaced completion is dropped without running.
//! - No coordinator borrow is held while a handler or completion runs, so
//!   either may call back into the coordinator.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | Unregister twice | Second call is a no-op |
//! | Unregister after the coordinator is dropped | No-op |
//! | `on_modal_did_close` with nothing pending | No-op |
//! | `close_all` while a completion is pending | Old completion dropped |
//! | Completion calls `close_all` | Its new completion is discarded when the slot clears |
//! | Handler panics | Propagates; later handlers in the broadcast do not run |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use scrim_runtime::reactive::{Binding, Observable, Subscription, bind_mapped};

use crate::config::{CoordinatorConfig, DiagnosticLevel, diagnostic};
use crate::visibility::{ModalVisibility, VisibilityKey};

type CloseHandler = dyn Fn(bool);
type Completion = Box<dyn FnOnce()>;

/// Identity of a registered close handler, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

struct Registry {
    /// Registered handlers, oldest first.
    handlers: Vec<(HandlerId, Rc<CloseHandler>)>,
    next_id: u64,
    stale_unregister: DiagnosticLevel,
}

impl Registry {
    fn push(&mut self, handler: Rc<CloseHandler>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        match self.handlers.iter().position(|(h, _)| *h == id) {
            Some(idx) => {
                self.handlers.remove(idx);
                true
            }
            None => false,
        }
    }

    fn contains(&self, id: HandlerId) -> bool {
        self.handlers.iter().any(|(h, _)| *h == id)
    }

    fn snapshot(&self) -> Vec<Rc<CloseHandler>> {
        self.handlers.iter().map(|(_, h)| Rc::clone(h)).collect()
    }
}

struct Shared {
    registry: Rc<RefCell<Registry>>,
    pending: RefCell<Option<Completion>>,
    visibility: Observable<ModalVisibility>,
    config: CoordinatorConfig,
}

/// Registry of modal close handlers with a single pending completion slot.
///
/// Construct one at application start and pass clones to every call site.
/// All clones share the same registry, completion slot and visibility store.
/// The type is `!Send`; it belongs to the UI thread.
///
/// # Example
///
/// ```
/// use scrim_modal::ModalCoordinator;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let modals = ModalCoordinator::new();
///
/// let open = Rc::new(Cell::new(true));
/// let o = Rc::clone(&open);
/// let unregister = modals.register(move |_is_navigating| o.set(false));
///
/// let done = Rc::new(Cell::new(false));
/// let d = Rc::clone(&done);
/// modals.close_all(move || d.set(true));
/// assert!(!open.get());
///
/// // The modal host reports that the close transition finished.
/// modals.on_modal_did_close();
/// assert!(done.get());
///
/// unregister.unregister();
/// assert!(modals.is_empty());
/// ```
#[derive(Clone)]
pub struct ModalCoordinator {
    shared: Rc<Shared>,
}

impl Default for ModalCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalCoordinator {
    /// Create a coordinator with the default policy and its own visibility
    /// store.
    #[must_use]
    pub fn new() -> Self {
        Self::build(CoordinatorConfig::default(), Observable::default())
    }

    /// Create a coordinator with an explicit diagnostics policy.
    #[must_use]
    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self::build(config, Observable::default())
    }

    /// Create a coordinator that publishes into an existing visibility store.
    #[must_use]
    pub fn with_visibility(visibility: Observable<ModalVisibility>) -> Self {
        Self::build(CoordinatorConfig::default(), visibility)
    }

    fn build(config: CoordinatorConfig, visibility: Observable<ModalVisibility>) -> Self {
        Self {
            shared: Rc::new(Shared {
                registry: Rc::new(RefCell::new(Registry {
                    handlers: Vec::new(),
                    next_id: 1,
                    stale_unregister: config.stale_unregister,
                })),
                pending: RefCell::new(None),
                visibility,
                config,
            }),
        }
    }

    // --- Registration ---

    /// Register a close handler at the end of the registry.
    ///
    /// The handler receives `is_navigating` on every broadcast. Registering
    /// the same closure twice yields two independent entries.
    pub fn register(&self, handler: impl Fn(bool) + 'static) -> Unregister {
        let mut registry = self.shared.registry.borrow_mut();
        let id = registry.push(Rc::new(handler));
        tracing::trace!(
            handler_id = id.id(),
            handlers = registry.handlers.len(),
            "close handler registered"
        );
        Unregister {
            registry: Rc::downgrade(&self.shared.registry),
            id,
        }
    }

    // --- Broadcast ---

    /// Close every registered modal, navigating away.
    ///
    /// Same as [`close_all_with`](Self::close_all_with) with
    /// `is_navigating = true`.
    pub fn close_all(&self, on_all_closed: impl FnOnce() + 'static) {
        self.close_all_with(on_all_closed, true);
    }

    /// Store `on_all_closed` as the pending completion, then call every
    /// registered handler, newest first, with `is_navigating`.
    ///
    /// Any completion still pending from an earlier call is dropped without
    /// running. Returns once every handler has been called; it does not
    /// wait for close transitions.
    pub fn close_all_with(&self, on_all_closed: impl FnOnce() + 'static, is_navigating: bool) {
        let superseded = self
            .shared
            .pending
            .replace(Some(Box::new(on_all_closed)));
        if superseded.is_some() {
            diagnostic!(
                self.shared.config.superseded_completion,
                "pending modal close completion replaced before it ran"
            );
        }
        drop(superseded);

        let snapshot = self.shared.registry.borrow().snapshot();
        let _span = tracing::debug_span!(
            "modal_close_all",
            handlers = snapshot.len(),
            is_navigating
        )
        .entered();

        for handler in snapshot.iter().rev() {
            handler(is_navigating);
        }
    }

    /// Run the pending completion, if any, then clear the slot.
    ///
    /// Called by the modal host once the last close transition has finished.
    /// The slot is cleared after the completion returns, so a completion that
    /// issues a new close request has that request's completion discarded.
    pub fn on_modal_did_close(&self) {
        let completion = self.shared.pending.borrow_mut().take();
        let Some(completion) = completion else {
            return;
        };
        tracing::debug!("running modal close completion");
        completion();

        let discarded = self.shared.pending.replace(None);
        if discarded.is_some() {
            diagnostic!(
                self.shared.config.superseded_completion,
                "pending modal close completion replaced before it ran"
            );
        }
    }

    // --- Visibility ---

    /// Publish whether any modal is visible.
    pub fn publish_visibility(&self, is_visible: bool) {
        self.publish(VisibilityKey::General, is_visible);
    }

    /// Publish that an alert modal has started (or stopped) opening.
    pub fn publish_alert_pending(&self, is_visible: bool) {
        self.publish(VisibilityKey::AlertPending, is_visible);
    }

    fn publish(&self, key: VisibilityKey, value: bool) {
        tracing::debug!(key = key.as_str(), value, "modal visibility published");
        self.shared.visibility.update(|v| v.merge(key, value));
    }

    /// Handle to the visibility store.
    #[must_use]
    pub fn visibility(&self) -> Observable<ModalVisibility> {
        self.shared.visibility.clone()
    }

    /// Whether the general visibility flag is set.
    #[must_use]
    pub fn is_modal_visible(&self) -> bool {
        self.shared.visibility.with(|v| v.is_visible)
    }

    /// Whether the alert-pending visibility flag is set.
    #[must_use]
    pub fn will_alert_modal_become_visible(&self) -> bool {
        self.shared
            .visibility
            .with(|v| v.will_alert_modal_become_visible)
    }

    /// Call `callback` whenever either visibility flag changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_visibility(
        &self,
        callback: impl Fn(&ModalVisibility) + 'static,
    ) -> Subscription {
        self.shared.visibility.subscribe(callback)
    }

    /// Read-only view of the general visibility flag.
    #[must_use]
    pub fn visibility_binding(&self) -> Binding<bool> {
        bind_mapped(&self.shared.visibility, |v| v.is_visible)
    }

    /// Read-only view of the alert-pending flag.
    #[must_use]
    pub fn alert_pending_binding(&self) -> Binding<bool> {
        bind_mapped(&self.shared.visibility, |v| v.will_alert_modal_become_visible)
    }

    // --- State Queries ---

    /// Number of registered close handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.shared.registry.borrow().handlers.len()
    }

    /// Whether no close handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }

    /// Whether a close completion is waiting for `on_modal_did_close`.
    #[must_use]
    pub fn has_pending_completion(&self) -> bool {
        self.shared.pending.borrow().is_some()
    }

    /// Diagnostics policy this coordinator was built with.
    #[must_use]
    pub fn config(&self) -> CoordinatorConfig {
        self.shared.config
    }
}

impl fmt::Debug for ModalCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalCoordinator")
            .field("handlers", &self.handler_count())
            .field("pending_completion", &self.has_pending_completion())
            .field("visibility", &self.shared.visibility.get())
            .finish()
    }
}

/// Removes one close handler from its coordinator.
///
/// Cheap to clone. Calling [`unregister`](Self::unregister) when the handler
/// is already gone, or after the coordinator was dropped, does nothing.
#[derive(Clone)]
pub struct Unregister {
    registry: Weak<RefCell<Registry>>,
    id: HandlerId,
}

impl Unregister {
    /// Remove the handler. Idempotent.
    pub fn unregister(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        if registry.remove(self.id) {
            tracing::trace!(
                handler_id = self.id.id(),
                handlers = registry.handlers.len(),
                "close handler unregistered"
            );
        } else {
            diagnostic!(
                registry.stale_unregister,
                handler_id = self.id.id(),
                "unregister for a close handler that is not registered"
            );
        }
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Whether the handler is still in the registry.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.borrow().contains(self.id))
    }

    /// Tie the registration to a guard that unregisters on drop.
    pub fn into_guard(self) -> CloseHandlerGuard {
        CloseHandlerGuard { unregister: self }
    }
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unregister")
            .field("id", &self.id)
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// RAII registration: the close handler is removed when this guard drops.
#[must_use = "dropping this guard unregisters the close handler"]
#[derive(Debug)]
pub struct CloseHandlerGuard {
    unregister: Unregister,
}

impl CloseHandlerGuard {
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.unregister.id()
    }
}

impl Drop for CloseHandlerGuard {
    fn drop(&mut self) {
        self.unregister.unregister();
    }
}
