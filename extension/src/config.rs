// Extension configuration
// Passed as optional JSON by the background page glue; every field has a default

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::host::IconSet;

pub const DEFAULT_BADGE_COLOR: &str = "#FB542B";
pub const DEFAULT_BADGE_TEXT: &str = "1";
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 50;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionConfig {
    pub badge_color: String,
    /// Text shown while the initial notification is pending
    pub badge_text: String,
    pub icons: IconSet,
    pub save_debounce_ms: u64,
    pub log_level: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            badge_color: DEFAULT_BADGE_COLOR.to_string(),
            badge_text: DEFAULT_BADGE_TEXT.to_string(),
            icons: IconSet::default(),
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            log_level: "info".to_string(),
        }
    }
}

impl ExtensionConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).context("Failed to parse extension config")?;

        if config.badge_text.is_empty() {
            anyhow::bail!("badgeText must not be empty");
        }

        Ok(config)
    }

    /// Config from optional JSON; absent or blank text is the default config
    pub fn from_optional_json(text: Option<&str>) -> Result<Self> {
        match text {
            Some(text) if !text.trim().is_empty() => Self::from_json(text),
            _ => Ok(Self::default()),
        }
    }

    pub fn log_level(&self) -> log::Level {
        log::Level::from_str(&self.log_level).unwrap_or(log::Level::Info)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
