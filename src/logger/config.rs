/// Logger configuration with per-tag debug gating
///
/// Configuration is held in a global so every subsystem logs through the
/// same filter set. Consumers adjust it programmatically via
/// [`set_logger_config`] / [`update_logger_config`].
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level threshold; messages above it are suppressed
    pub min_level: LogLevel,
    /// Tags with debug-level logging enabled
    pub debug_tags: HashSet<&'static str>,
    /// When true, verbose logs pass for every tag
    pub verbose: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose: false,
        }
    }
}

impl LoggerConfig {
    /// Enable debug logging for a single tag
    pub fn with_debug_tag(mut self, tag: LogTag) -> Self {
        self.debug_tags.insert(tag.debug_key());
        self
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub fn update_logger_config<F>(update: F)
where
    F: FnOnce(&mut LoggerConfig),
{
    let mut config = LOGGER_CONFIG.write();
    update(&mut config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(tag.debug_key())
}
