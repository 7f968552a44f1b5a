#![forbid(unsafe_code)]

//! Modal visibility flags published for the rest of the UI.
//!
//! Both flags live in one [`ModalVisibility`] record. Publishing one flag
//! merges it into the record and leaves the other untouched, so a store
//! shared with other writers never loses a field.

use std::fmt;

/// Observed modal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "state-persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct ModalVisibility {
    /// Some modal is on screen.
    pub is_visible: bool,
    /// An alert-class modal has started opening but its open transition has
    /// not finished.
    pub will_alert_modal_become_visible: bool,
}

/// Names one field of [`ModalVisibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityKey {
    /// General modal visibility.
    General,
    /// Alert modal pending visibility.
    AlertPending,
}

impl VisibilityKey {
    /// Field name as it appears in logs and serialized state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "is_visible",
            Self::AlertPending => "will_alert_modal_become_visible",
        }
    }
}

impl fmt::Display for VisibilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ModalVisibility {
    /// Read the flag named by `key`.
    #[must_use]
    pub const fn get(&self, key: VisibilityKey) -> bool {
        match key {
            VisibilityKey::General => self.is_visible,
            VisibilityKey::AlertPending => self.will_alert_modal_become_visible,
        }
    }

    /// Overwrite the flag named by `key`.
    pub fn merge(&mut self, key: VisibilityKey, value: bool) {
        match key {
            VisibilityKey::General => self.is_visible = value,
            VisibilityKey::AlertPending => self.will_alert_modal_become_visible = value,
        }
    }
}
