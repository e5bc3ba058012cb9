//! Log output configuration.

use serde::{Deserialize, Serialize};

fn default_level() -> String {
    "info".to_string()
}

const fn default_ansi() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Filter directive used when `CMDB_LOG` is unset (e.g. `info`,
    /// `cmdb_store=debug`).
    #[serde(default = "default_level")]
    pub level: String,

    /// Colored output.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: default_ansi(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.ansi);
    }
}
