#![forbid(unsafe_code)]

//! Diagnostic policy for the modal coordinator.
//!
//! Nothing here changes coordination semantics. The policy only decides how
//! loudly the two silent paths are reported: an unregister for a handler
//! that is already gone, and a pending completion dropped because a newer
//! close request replaced it.
//!
//! With the `policy-config` feature the policy can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! stale_unregister = "warn"
//! superseded_completion = "debug"
//! ```
//!
//! Missing keys fall back to [`CoordinatorConfig::default`].

#[cfg(feature = "policy-config")]
use std::path::{Path, PathBuf};

/// Log level used for a coordinator diagnostic, or `Off` to stay silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DiagnosticLevel {
    #[default]
    Off,
    Trace,
    Debug,
    Warn,
}

/// Emit a tracing event at a runtime-selected [`DiagnosticLevel`].
macro_rules! diagnostic {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            $crate::config::DiagnosticLevel::Off => {}
            $crate::config::DiagnosticLevel::Trace => tracing::trace!($($arg)+),
            $crate::config::DiagnosticLevel::Debug => tracing::debug!($($arg)+),
            $crate::config::DiagnosticLevel::Warn => tracing::warn!($($arg)+),
        }
    };
}
pub(crate) use diagnostic;

/// Coordinator diagnostics policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct CoordinatorConfig {
    /// Reported when an unregister finds its handler already removed.
    pub stale_unregister: DiagnosticLevel,
    /// Reported when a pending completion is replaced without running.
    pub superseded_completion: DiagnosticLevel,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stale_unregister: DiagnosticLevel::Off,
            superseded_completion: DiagnosticLevel::Debug,
        }
    }
}

impl CoordinatorConfig {
    /// Set the level for unregistering an already-removed handler.
    #[must_use]
    pub const fn with_stale_unregister(mut self, level: DiagnosticLevel) -> Self {
        self.stale_unregister = level;
        self
    }

    /// Set the level for a pending completion dropped without running.
    #[must_use]
    pub const fn with_superseded_completion(mut self, level: DiagnosticLevel) -> Self {
        self.superseded_completion = level;
        self
    }
}

/// Errors from loading a [`CoordinatorConfig`].
#[cfg(feature = "policy-config")]
#[derive(Debug)]
pub enum ConfigError {
    /// The policy file could not be read.
    Io(std::io::Error),
    /// TOML was malformed or had unknown keys.
    Toml(String),
    /// JSON was malformed or had unknown keys.
    Json(String),
    /// The file extension is neither `.toml` nor `.json`.
    UnknownFormat(PathBuf),
}

#[cfg(feature = "policy-config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read coordinator policy: {e}"),
            Self::Toml(msg) => write!(f, "invalid TOML coordinator policy: {msg}"),
            Self::Json(msg) => write!(f, "invalid JSON coordinator policy: {msg}"),
            Self::UnknownFormat(path) => write!(
                f,
                "unsupported coordinator policy format: {}",
                path.display()
            ),
        }
    }
}

#[cfg(feature = "policy-config")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "policy-config")]
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "policy-config")]
impl CoordinatorConfig {
    /// Parse a policy from TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] on malformed input or unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Parse a policy from JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input or unknown keys.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Load a policy file, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownFormat`] for other extensions, otherwise the
    /// read or parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse: fn(&str) -> Result<Self, ConfigError> =
            match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => Self::from_toml_str,
                Some("json") => Self::from_json_str,
                _ => return Err(ConfigError::UnknownFormat(path.to_path_buf())),
            };
        let text = std::fs::read_to_string(path)?;
        let config = parse(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded coordinator policy");
        Ok(config)
    }
}
