//! Metamodel store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_trail_dir() -> String {
    ".cmdb/trail".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Directory holding one `{kind}.jsonl` trail file per entity kind.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: String,

    /// Append every save and delete to the trail, and replay it on open.
    #[serde(default)]
    pub trail_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            trail_dir: default_trail_dir(),
            trail_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Trail enabled with a usable directory.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.trail_enabled && !self.trail_dir.trim().is_empty()
    }

    #[must_use]
    pub fn trail_path(&self) -> PathBuf {
        PathBuf::from(&self.trail_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = StoreConfig::default();
        assert_eq!(config.trail_dir, ".cmdb/trail");
        assert!(!config.trail_enabled);
        assert!(!config.is_configured());
    }

    #[test]
    fn enabled_with_blank_dir_is_not_configured() {
        let config = StoreConfig {
            trail_dir: "  ".into(),
            trail_enabled: true,
        };
        assert!(!config.is_configured());
    }
}
