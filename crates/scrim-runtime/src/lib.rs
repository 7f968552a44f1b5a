#![forbid(unsafe_code)]

//! Runtime support shared by the scrim crates.
//!
//! The [`reactive`] module carries the observable state that modal
//! visibility is published through. With the `tracing-json` feature,
//! [`logging::init`] installs a JSON subscriber for hosts that do not bring
//! their own.

#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod reactive;

pub use reactive::{Binding, Observable, Subscription};
