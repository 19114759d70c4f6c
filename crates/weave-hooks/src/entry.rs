//! Plugin list entries.
//!
//! Callers assemble an orchestrator from a list of entries rather than bare
//! plugins so a plugin can be conditionally disabled without resorting to
//! sentinel values. Disabled entries are filtered out before initialization;
//! the dispatcher never sees them.

use std::fmt;
use std::sync::Arc;

use crate::plugin::Plugin;

/// One slot in the caller-supplied plugin list.
pub enum PluginEntry {
    /// An active plugin.
    Enabled(Arc<dyn Plugin>),
    /// A disabled slot, filtered before initialization.
    Disabled,
}

impl PluginEntry {
    /// Wrap a plugin as an enabled entry.
    #[must_use]
    pub fn enabled(plugin: impl Plugin + 'static) -> Self {
        Self::Enabled(Arc::new(plugin))
    }

    /// Whether this entry carries a plugin.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Extract the plugin, if enabled.
    #[must_use]
    pub fn into_enabled(self) -> Option<Arc<dyn Plugin>> {
        match self {
            Self::Enabled(plugin) => Some(plugin),
            Self::Disabled => None,
        }
    }
}

impl From<Arc<dyn Plugin>> for PluginEntry {
    fn from(plugin: Arc<dyn Plugin>) -> Self {
        Self::Enabled(plugin)
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled(plugin) => f.debug_tuple("Enabled").field(&plugin.name()).finish(),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}

/// Enable a plugin only when `condition` holds.
#[must_use]
pub fn enable_if(condition: bool, plugin: impl Plugin + 'static) -> PluginEntry {
    if condition {
        PluginEntry::enabled(plugin)
    } else {
        PluginEntry::Disabled
    }
}
