/// Log tags identifying which subsystem produced a message
///
/// Tags drive per-module debug gating: debug logs for a tag are only shown
/// when that tag is enabled in the logger configuration.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Pool,
    Cache,
    Chart,
    Price,
}

impl LogTag {
    /// Display name used in log line prefixes
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Pool => "POOL",
            LogTag::Cache => "CACHE",
            LogTag::Chart => "CHART",
            LogTag::Price => "PRICE",
        }
    }

    /// Key used to enable debug logging for this tag
    pub fn debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Pool => "pool",
            LogTag::Cache => "cache",
            LogTag::Chart => "chart",
            LogTag::Price => "price",
        }
    }

    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Pool,
            LogTag::Cache,
            LogTag::Chart,
            LogTag::Price,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
