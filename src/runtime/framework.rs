use crate::runtime::config::RuntimeConfig;
use crate::utils::interner::IdManager;

/// Explicit runtime context.
///
/// Owns the id registry and configuration shared by every model loaded
/// through it. Creating one applies the configured log level once; there is
/// no global state, so several frameworks with different settings can
/// coexist (they only share the process-wide `log` level).
#[derive(Debug, Clone)]
pub struct Framework {
    ids: IdManager,
    config: RuntimeConfig,
}

impl Framework {
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        log::set_max_level(config.log_level);

        let ids = IdManager::new();
        ids.preload_standard_ids();
        log::debug!("Framework started with {} standard ids", ids.len());

        Self { ids, config }
    }

    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdManager {
        &self.ids
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for Framework {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
