// Host API seams
// The controller only talks to the browser through these traits

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::protocol::TwitterTip;

/// Extension-local key/value storage (`chrome.storage.local`)
///
/// Values are plain strings; the flags are stored as `"true"` / `"false"`.
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Browser-action badge and icon
pub trait BadgeApi {
    fn set_background_color(&self, color: &str) -> Result<()>;

    fn set_icon(&self, icons: &IconSet) -> Result<()>;

    /// Empty text clears the badge
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Tab/window queries
#[async_trait(?Send)]
pub trait TabsApi {
    /// Active tab in the current window, if any
    async fn active_tab(&self) -> Result<Option<Tab>>;
}

/// Host rewards API (`chrome.braveRewards`)
#[async_trait(?Send)]
pub trait RewardsApi {
    /// Fire-and-forget tip request
    fn donate_to_twitter_user(&self, tab_id: i32, tip: &TwitterTip) -> Result<()>;

    async fn rewards_main_enabled(&self) -> Result<bool>;
}

/// Synchronous page storage (`window.localStorage`)
pub trait LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Minimal tab descriptor returned by the host
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub id: Option<i32>,
}

/// Browser-action icon paths at 18, 36 and 54 px
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSet {
    #[serde(rename = "18")]
    pub small: String,
    #[serde(rename = "36")]
    pub medium: String,
    #[serde(rename = "54")]
    pub large: String,
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            small: "img/rewards-on.png".to_string(),
            medium: "img/rewards-on@2x.png".to_string(),
            large: "img/rewards-on@3x.png".to_string(),
        }
    }
}

impl IconSet {
    /// (size, path) pairs in ascending size
    pub fn entries(&self) -> [(u32, &str); 3] {
        [
            (18, self.small.as_str()),
            (36, self.medium.as_str()),
            (54, self.large.as_str()),
        ]
    }
}
