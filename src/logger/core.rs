/// Core logging implementation with automatic filtering
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Messages above the minimum level threshold are suppressed
/// 3. Debug level requires the tag to be debug-enabled
/// 4. Verbose level requires the global verbose switch
use super::config::{get_logger_config, is_debug_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let config = get_logger_config();

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    if level == LogLevel::Verbose {
        return config.verbose;
    }

    level <= config.min_level
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}
