// Notification & badge controller
// Reconciles the toolbar badge with the persisted dismissal flag and routes
// runtime messages from the tip panel and content scripts

use std::cell::Cell;
use std::rc::Rc;

use futures::FutureExt;

use crate::config::ExtensionConfig;
use crate::host::{BadgeApi, KeyValueStore, RewardsApi, TabsApi};
use crate::protocol::{Dispatch, Message, RewardsEnabledResponse, TwitterTip};

pub const DISMISSED_KEY: &str = "is_dismissed";
pub const PANEL_OPEN_KEY: &str = "rewards_panel_open";

/// `runtime.onInstalled` reason for a first install
pub const INSTALL_REASON: &str = "install";

const TRUE: &str = "true";
const FALSE: &str = "false";

/// Where the initial notification stands in this process
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationState {
    /// Flag is "false", badge shows the notification count
    Fresh,
    /// Panel was opened while fresh; flag removed, badge cleared
    Dismissed,
    /// Flag absent or "true", badge unset
    Acknowledged,
}

/// Host APIs injected at construction
#[derive(Clone)]
pub struct HostApis {
    pub storage: Rc<dyn KeyValueStore>,
    pub badge: Rc<dyn BadgeApi>,
    pub tabs: Rc<dyn TabsApi>,
    pub rewards: Rc<dyn RewardsApi>,
}

/// Background controller, one per extension process
///
/// Lifecycle:
/// 1. `new` + `init` when the background page loads (badge colour and icon)
/// 2. `on_installed` / `on_startup` from the runtime lifecycle events
/// 3. `on_connect` / `on_disconnect` for every panel port
/// 4. `on_message` for every runtime message
///
/// There is no teardown; the controller lives as long as the process.
#[derive(Clone)]
pub struct NotificationController {
    inner: Rc<ControllerInner>,
}

struct ControllerInner {
    host: HostApis,
    config: ExtensionConfig,
    state: Cell<NotificationState>,
}

impl NotificationController {
    pub fn new(host: HostApis, config: ExtensionConfig) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                host,
                config,
                state: Cell::new(NotificationState::Acknowledged),
            }),
        }
    }

    pub fn state(&self) -> NotificationState {
        self.inner.state.get()
    }

    /// Badge text implied by the current state
    pub fn badge_text(&self) -> &str {
        match self.state() {
            NotificationState::Fresh => self.inner.config.badge_text.as_str(),
            NotificationState::Dismissed | NotificationState::Acknowledged => "",
        }
    }

    /// Badge colour and icon; set once per process
    pub fn init(&self) {
        let badge = &self.inner.host.badge;

        if let Err(e) = badge.set_background_color(&self.inner.config.badge_color) {
            log::warn!("Failed to set badge colour: {:#}", e);
        }
        if let Err(e) = badge.set_icon(&self.inner.config.icons) {
            log::warn!("Failed to set browser action icon: {:#}", e);
        }
    }

    /// `runtime.onInstalled`
    pub async fn on_installed(&self, reason: &str) {
        if reason != INSTALL_REASON {
            log::debug!("Installed event ({}), nothing to do", reason);
            return;
        }

        log::info!("🎉 Fresh install, showing initial notification");

        if let Err(e) = self.inner.host.storage.set(DISMISSED_KEY, FALSE).await {
            log::warn!("Failed to store dismissal flag: {:#}", e);
            return;
        }

        self.inner.state.set(NotificationState::Fresh);
        self.show_badge();
    }

    /// `runtime.onStartup`: re-derive the notification from storage
    pub async fn on_startup(&self) {
        match self.dismissal_pending().await {
            Some(true) => {
                log::info!("Initial notification still pending");
                self.inner.state.set(NotificationState::Fresh);
                self.show_badge();
            }
            Some(false) => self.inner.state.set(NotificationState::Acknowledged),
            None => {}
        }
    }

    /// `runtime.onConnect`: tracks the panel and dismisses a pending notification
    pub async fn on_connect(&self) {
        self.set_panel_open(true).await;

        if self.dismissal_pending().await != Some(true) {
            return;
        }

        log::info!("Panel opened, dismissing initial notification");
        self.inner.state.set(NotificationState::Dismissed);
        self.set_badge_text("");

        if let Err(e) = self.inner.host.storage.remove(DISMISSED_KEY).await {
            log::warn!("Failed to remove dismissal flag: {:#}", e);
        }
    }

    /// Port `onDisconnect`
    pub async fn on_disconnect(&self) {
        self.set_panel_open(false).await;
    }

    /// `runtime.onMessage`
    pub fn on_message(&self, message: Message) -> Dispatch {
        match message {
            Message::DonateToTwitterUser(tip) => {
                let this = self.clone();
                Dispatch::NoResponse(Some(
                    async move { this.donate_to_twitter_user(tip).await }.boxed_local(),
                ))
            }
            Message::RewardsEnabled => {
                let rewards = self.inner.host.rewards.clone();
                let reply = async move {
                    let enabled = match rewards.rewards_main_enabled().await {
                        Ok(enabled) => enabled,
                        Err(e) => {
                            log::warn!("Rewards status unavailable, replying disabled: {:#}", e);
                            false
                        }
                    };
                    RewardsEnabledResponse { enabled }
                };
                Dispatch::Deferred(reply.boxed_local())
            }
            Message::Unknown(tag) => {
                log::debug!("Ignoring message {:?}", tag);
                Dispatch::none()
            }
        }
    }

    /// Forward a tip to the rewards API for the active tab, if there is one
    pub async fn donate_to_twitter_user(&self, tip: TwitterTip) {
        let tab = match self.inner.host.tabs.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                log::warn!("Failed to query active tab: {:#}", e);
                return;
            }
        };

        let Some(tab_id) = tab.and_then(|tab| tab.id) else {
            log::debug!("No active tab, dropping tip for @{}", tip.screen_name);
            return;
        };

        log::info!("💸 Tip for @{} on tab {}", tip.screen_name, tab_id);

        if let Err(e) = self.inner.host.rewards.donate_to_twitter_user(tab_id, &tip) {
            log::warn!("Failed to forward tip: {:#}", e);
        }
    }

    /// `Some(true)` when the flag reads "false"; `None` if storage failed
    async fn dismissal_pending(&self) -> Option<bool> {
        match self.inner.host.storage.get(DISMISSED_KEY).await {
            Ok(value) => Some(value.as_deref() == Some(FALSE)),
            Err(e) => {
                log::warn!("Failed to read dismissal flag: {:#}", e);
                None
            }
        }
    }

    async fn set_panel_open(&self, open: bool) {
        let value = if open { TRUE } else { FALSE };
        if let Err(e) = self.inner.host.storage.set(PANEL_OPEN_KEY, value).await {
            log::warn!("Failed to store panel state: {:#}", e);
        }
    }

    fn show_badge(&self) {
        let text = self.inner.config.badge_text.clone();
        self.set_badge_text(&text);
    }

    fn set_badge_text(&self, text: &str) {
        if let Err(e) = self.inner.host.badge.set_text(text) {
            log::warn!("Failed to set badge text: {:#}", e);
        }
    }
}
