// In-memory host doubles for unit tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::config::ExtensionConfig;
use crate::controller::{HostApis, NotificationController};
use crate::host::{BadgeApi, IconSet, KeyValueStore, LocalStore, RewardsApi, Tab, TabsApi};
use crate::protocol::TwitterTip;
use crate::services::Timer;

#[derive(Default)]
pub struct MockStorage {
    pub values: RefCell<HashMap<String, String>>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
    pub writes: Cell<usize>,
}

impl MockStorage {
    pub fn with(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.values.borrow_mut().insert(key.to_string(), value.to_string());
        storage
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MockStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.get() {
            return Err(anyhow!("storage read failed"));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(anyhow!("storage write failed"));
        }
        self.writes.set(self.writes.get() + 1);
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(anyhow!("storage write failed"));
        }
        self.writes.set(self.writes.get() + 1);
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockBadge {
    pub color: RefCell<Option<String>>,
    pub icons: RefCell<Option<IconSet>>,
    /// `None` until the badge text is first set
    pub text: RefCell<Option<String>>,
    pub text_updates: Cell<usize>,
}

impl MockBadge {
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl BadgeApi for MockBadge {
    fn set_background_color(&self, color: &str) -> Result<()> {
        *self.color.borrow_mut() = Some(color.to_string());
        Ok(())
    }

    fn set_icon(&self, icons: &IconSet) -> Result<()> {
        *self.icons.borrow_mut() = Some(icons.clone());
        Ok(())
    }

    fn set_text(&self, text: &str) -> Result<()> {
        self.text_updates.set(self.text_updates.get() + 1);
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTabs {
    pub active: RefCell<Option<Tab>>,
    pub fail: Cell<bool>,
}

impl MockTabs {
    pub fn with_tab(id: i32) -> Self {
        Self {
            active: RefCell::new(Some(Tab { id: Some(id) })),
            fail: Cell::new(false),
        }
    }
}

#[async_trait(?Send)]
impl TabsApi for MockTabs {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        if self.fail.get() {
            return Err(anyhow!("tabs.query failed"));
        }
        Ok(self.active.borrow().clone())
    }
}

#[derive(Default)]
pub struct MockRewards {
    pub enabled: Cell<bool>,
    pub fail_enabled: Cell<bool>,
    pub donations: RefCell<Vec<(i32, TwitterTip)>>,
    pub enabled_queries: Cell<usize>,
}

#[async_trait(?Send)]
impl RewardsApi for MockRewards {
    fn donate_to_twitter_user(&self, tab_id: i32, tip: &TwitterTip) -> Result<()> {
        self.donations.borrow_mut().push((tab_id, tip.clone()));
        Ok(())
    }

    async fn rewards_main_enabled(&self) -> Result<bool> {
        self.enabled_queries.set(self.enabled_queries.get() + 1);
        if self.fail_enabled.get() {
            return Err(anyhow!("getRewardsMainEnabled failed"));
        }
        Ok(self.enabled.get())
    }
}

#[derive(Default)]
pub struct MockLocalStore {
    pub items: RefCell<HashMap<String, String>>,
    pub fail: Cell<bool>,
    pub writes: Cell<usize>,
}

impl LocalStore for MockLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail.get() {
            return Err(anyhow!("localStorage unavailable"));
        }
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail.get() {
            return Err(anyhow!("localStorage unavailable"));
        }
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Debounce timer whose window elapses immediately
pub struct ImmediateTimer;

impl Timer for ImmediateTimer {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        futures::future::ready(()).boxed_local()
    }
}

/// Immediate timer that remembers each requested window
#[derive(Default)]
pub struct RecordingTimer {
    pub windows: RefCell<Vec<Duration>>,
}

impl Timer for RecordingTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.windows.borrow_mut().push(duration);
        futures::future::ready(()).boxed_local()
    }
}

/// Controller wired to fresh mocks, with handles kept for assertions
pub struct Harness {
    pub storage: Rc<MockStorage>,
    pub badge: Rc<MockBadge>,
    pub tabs: Rc<MockTabs>,
    pub rewards: Rc<MockRewards>,
    pub controller: NotificationController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MockStorage::default(), MockTabs::default())
    }

    pub fn with(storage: MockStorage, tabs: MockTabs) -> Self {
        let storage = Rc::new(storage);
        let badge = Rc::new(MockBadge::default());
        let tabs = Rc::new(tabs);
        let rewards = Rc::new(MockRewards::default());

        let host = HostApis {
            storage: storage.clone(),
            badge: badge.clone(),
            tabs: tabs.clone(),
            rewards: rewards.clone(),
        };

        Self {
            storage,
            badge,
            tabs,
            rewards,
            controller: NotificationController::new(host, ExtensionConfig::default()),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
