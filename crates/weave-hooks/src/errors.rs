//! Hook error types.

use thiserror::Error;

/// Errors raised by plugin hook implementations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A hook implementation reported a failure.
    #[error("hook error in plugin '{plugin}': {message}")]
    Hook {
        /// Plugin name.
        plugin: String,
        /// Error message from the hook.
        message: String,
    },

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl PluginError {
    /// Create a hook failure for a named plugin.
    #[must_use]
    pub fn hook(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while constructing an orchestrator.
///
/// Initialization is fail-fast: the first failing `on_init` aborts
/// construction and no partial orchestrator is usable.
#[derive(Debug, Error)]
pub enum InitError {
    /// A plugin's `on_init` hook failed.
    #[error("plugin '{plugin}' failed to initialize: {source}")]
    Plugin {
        /// Plugin name.
        plugin: String,
        /// Underlying hook error.
        #[source]
        source: PluginError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_error_display() {
        let error = PluginError::hook("auth", "missing token");
        assert_eq!(error.to_string(), "hook error in plugin 'auth': missing token");
    }

    #[test]
    fn test_internal_error_display() {
        let error = PluginError::Internal("broken".to_string());
        assert_eq!(error.to_string(), "broken");
    }

    #[test]
    fn test_init_error_carries_source() {
        let error = InitError::Plugin {
            plugin: "cache".to_string(),
            source: PluginError::Internal("no store".to_string()),
        };
        assert!(error.to_string().contains("cache"));
        assert!(error.to_string().contains("no store"));
    }
}
