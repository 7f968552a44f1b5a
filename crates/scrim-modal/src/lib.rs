#![forbid(unsafe_code)]

//! Close-all coordination and visibility flags for modals rendered by
//! independent UI components.
//!
//! - [`ModalCoordinator`]: close-handler registry, reverse-order broadcast,
//!   and the single pending "all closed" completion.
//! - [`Unregister`] / [`CloseHandlerGuard`]: explicit and RAII removal of a
//!   registered handler.
//! - [`ModalVisibility`]: the two published flags, held in a
//!   [`scrim_runtime::Observable`] so other components can react.
//! - [`CoordinatorConfig`]: diagnostics policy for the silent paths.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --close_all--> Closing --handlers returned--> Idle + pending
//!   ^                                                     |
//!   +------------------ on_modal_did_close ---------------+
//! ```
//!
//! A second `close_all` in any state replaces the pending completion.

pub mod config;
pub mod coordinator;
pub mod visibility;

pub use config::{CoordinatorConfig, DiagnosticLevel};
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use coordinator::{CloseHandlerGuard, HandlerId, ModalCoordinator, Unregister};
pub use visibility::{ModalVisibility, VisibilityKey};
