#![forbid(unsafe_code)]

//! Reactive state for modal hosts.
//!
//! - [`Observable`]: shared, version-tracked value with change callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Binding`]: read-only projection of observable state.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and pruned lazily
//! during notification. No borrow is held while a subscriber runs.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod binding;
pub mod observable;

pub use binding::{Binding, bind_mapped};
pub use observable::{Observable, Subscription};
