#![forbid(unsafe_code)]

//! Read-only projections of [`Observable`] state.
//!
//! A [`Binding<T>`] answers "what is the value right now" without exposing
//! the writer side of an observable. Hosts hand bindings to components that
//! only need to read a flag, e.g. whether any modal is on screen.
//!
//! ```ignore
//! use scrim_runtime::reactive::{Observable, bind_mapped};
//!
//! let depth = Observable::new(0usize);
//! let any_open = bind_mapped(&depth, |d| *d > 0);
//! assert!(!any_open.get());
//!
//! depth.set(2);
//! assert!(any_open.get());
//! ```
//!
//! `get()` reads through to the source on every call; nothing is cached.

use std::fmt;
use std::rc::Rc;

use super::observable::Observable;

/// A read-only, lazily evaluated view of some observable state.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .finish()
    }
}

impl<T: 'static> Binding<T> {
    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }
}

/// Binding that projects the observable's value through `map`.
pub fn bind_mapped<S: Clone + PartialEq + 'static, T: 'static>(
    source: &Observable<S>,
    map: impl Fn(&S) -> T + 'static,
) -> Binding<T> {
    let src = source.clone();
    Binding {
        eval: Rc::new(move || src.with(|v| map(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_binding_projects_field() {
        let state = Observable::new((false, true));
        let alert = bind_mapped(&state, |s| s.1);
        assert!(alert.get());

        state.set((false, false));
        assert!(!alert.get());
    }

    #[test]
    fn clone_shares_source() {
        let depth = Observable::new(1usize);
        let b1 = bind_mapped(&depth, |d| *d > 1);
        let b2 = b1.clone();
        depth.set(3);
        assert!(b1.get());
        assert!(b2.get());
    }

    #[test]
    fn debug_shows_current_value() {
        let visible = Observable::new(true);
        let b = bind_mapped(&visible, |v| !v);
        assert_eq!(format!("{b:?}"), "Binding { value: false }");
    }
}
