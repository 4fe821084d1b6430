// chrome.* bindings for the background page
// Badge, tab query and the rewards API

use std::rc::Rc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use wasm_bindgen::prelude::*;

use super::storage::ChromeLocalStorage;
use super::{js_error, with_callback};
use crate::controller::HostApis;
use crate::host::{BadgeApi, IconSet, RewardsApi, Tab, TabsApi};
use crate::protocol::TwitterTip;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "browserAction"], js_name = setBadgeBackgroundColor, catch)]
    fn set_badge_background_color(details: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "browserAction"], js_name = setIcon, catch)]
    fn set_browser_action_icon(details: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "browserAction"], js_name = setBadgeText, catch)]
    fn set_badge_text(details: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query, catch)]
    fn tabs_query(query_info: &JsValue, callback: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "braveRewards"], js_name = donateToTwitterUser, catch)]
    fn brave_donate_to_twitter_user(
        tab_id: i32,
        user_id: &str,
        name: &str,
        screen_name: &str,
        tweet_text: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "braveRewards"], js_name = getRewardsMainEnabled, catch)]
    fn brave_get_rewards_main_enabled(callback: &js_sys::Function) -> Result<(), JsValue>;
}

/// `{ key: value }` as a JS object
fn details(key: &str, value: &JsValue) -> Result<JsValue> {
    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &JsValue::from_str(key), value).map_err(js_error)?;
    Ok(obj.into())
}

/// `chrome.browserAction`
pub struct ChromeBadge;

impl BadgeApi for ChromeBadge {
    fn set_background_color(&self, color: &str) -> Result<()> {
        let details = details("color", &JsValue::from_str(color))?;
        set_badge_background_color(&details)
            .map_err(js_error)
            .context("browserAction.setBadgeBackgroundColor")
    }

    fn set_icon(&self, icons: &IconSet) -> Result<()> {
        let path = js_sys::Object::new();
        for (size, url) in icons.entries() {
            js_sys::Reflect::set(&path, &JsValue::from(size), &JsValue::from_str(url))
                .map_err(js_error)?;
        }

        let details = details("path", &JsValue::from(path))?;
        set_browser_action_icon(&details)
            .map_err(js_error)
            .context("browserAction.setIcon")
    }

    fn set_text(&self, text: &str) -> Result<()> {
        let details = details("text", &JsValue::from_str(text))?;
        set_badge_text(&details)
            .map_err(js_error)
            .context("browserAction.setBadgeText")
    }
}

/// `chrome.tabs`
pub struct ChromeTabs;

#[async_trait(?Send)]
impl TabsApi for ChromeTabs {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        let query = details("active", &JsValue::TRUE)?;
        js_sys::Reflect::set(&query, &JsValue::from_str("currentWindow"), &JsValue::TRUE)
            .map_err(js_error)?;

        let tabs = with_callback(|callback| tabs_query(&query, callback))
            .await
            .map_err(js_error)
            .context("tabs.query")?;

        if !js_sys::Array::is_array(&tabs) {
            return Ok(None);
        }

        let first = js_sys::Array::from(&tabs).get(0);
        if first.is_undefined() {
            return Ok(None);
        }

        let id = js_sys::Reflect::get(&first, &JsValue::from_str("id"))
            .map_err(js_error)?
            .as_f64()
            .map(|id| id as i32);

        Ok(Some(Tab { id }))
    }
}

/// `chrome.braveRewards`
pub struct BraveRewards;

#[async_trait(?Send)]
impl RewardsApi for BraveRewards {
    fn donate_to_twitter_user(&self, tab_id: i32, tip: &TwitterTip) -> Result<()> {
        brave_donate_to_twitter_user(
            tab_id,
            &tip.user_id,
            &tip.name,
            &tip.screen_name,
            &tip.tweet_text,
        )
        .map_err(js_error)
        .context("braveRewards.donateToTwitterUser")
    }

    async fn rewards_main_enabled(&self) -> Result<bool> {
        let enabled = with_callback(brave_get_rewards_main_enabled)
            .await
            .map_err(js_error)
            .context("braveRewards.getRewardsMainEnabled")?;

        enabled
            .as_bool()
            .with_context(|| format!("getRewardsMainEnabled returned {:?}", enabled))
    }
}

/// Host APIs of a running browser
pub fn host_apis() -> HostApis {
    HostApis {
        storage: Rc::new(ChromeLocalStorage::new()),
        badge: Rc::new(ChromeBadge),
        tabs: Rc::new(ChromeTabs),
        rewards: Rc::new(BraveRewards),
    }
}
