// Storage integration
// chrome.storage.local for the background flags, window.localStorage for the
// payments page state

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::{js_error, with_callback};
use crate::config::ExtensionConfig;
use crate::host::{KeyValueStore, LocalStore};
use crate::payments::PaymentsState;

/// localStorage key of the payments page state
pub const PAYMENTS_KEY: &str = "payments-data";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get, catch)]
    fn local_get(keys: &JsValue, callback: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set, catch)]
    fn local_set(items: &JsValue, callback: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = remove, catch)]
    fn local_remove(keys: &JsValue, callback: &js_sys::Function) -> Result<(), JsValue>;
}

/// `chrome.storage.local`
pub struct ChromeLocalStorage;

impl ChromeLocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChromeLocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn key_list(key: &str) -> JsValue {
    let keys = js_sys::Array::new();
    keys.push(&JsValue::from_str(key));
    keys.into()
}

#[async_trait(?Send)]
impl KeyValueStore for ChromeLocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let keys = key_list(key);
        let result = with_callback(|callback| local_get(&keys, callback))
            .await
            .map_err(js_error)
            .with_context(|| format!("chrome.storage.local.get({})", key))?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }

        let value = js_sys::Reflect::get(&result, &JsValue::from_str(key)).map_err(js_error)?;
        Ok(value.as_string())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let items = js_sys::Object::new();
        js_sys::Reflect::set(&items, &JsValue::from_str(key), &JsValue::from_str(value))
            .map_err(js_error)?;

        with_callback(|callback| local_set(&items, callback))
            .await
            .map_err(js_error)
            .with_context(|| format!("chrome.storage.local.set({})", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let keys = key_list(key);
        with_callback(|callback| local_remove(&keys, callback))
            .await
            .map_err(js_error)
            .with_context(|| format!("chrome.storage.local.remove({})", key))?;
        Ok(())
    }
}

/// `window.localStorage`
pub struct WindowLocalStorage {
    storage: web_sys::Storage,
}

impl WindowLocalStorage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().context("No window in this context")?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .context("localStorage is disabled")?;
        Ok(Self { storage })
    }
}

impl LocalStore for WindowLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_error)
    }
}

/// Delay source for the save debounce
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// setTimeout-backed timer
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }
}

/// Payments page persistence
///
/// `save` coalesces: every call restarts the window, and only the state
/// passed to the last call inside the window reaches storage.
#[derive(Clone)]
pub struct PaymentsStorage {
    inner: Rc<PaymentsStorageInner>,
}

struct PaymentsStorageInner {
    store: Rc<dyn LocalStore>,
    timer: Rc<dyn Timer>,
    window: Duration,
    generation: Cell<u64>,
    pending: RefCell<Option<PaymentsState>>,
}

impl PaymentsStorage {
    pub fn new(store: Rc<dyn LocalStore>, timer: Rc<dyn Timer>, window: Duration) -> Self {
        Self {
            inner: Rc::new(PaymentsStorageInner {
                store,
                timer,
                window,
                generation: Cell::new(0),
                pending: RefCell::new(None),
            }),
        }
    }

    /// Storage whose debounce window comes from `saveDebounceMs`
    pub fn from_config(
        store: Rc<dyn LocalStore>,
        timer: Rc<dyn Timer>,
        config: &ExtensionConfig,
    ) -> Self {
        Self::new(store, timer, config.save_debounce())
    }

    pub fn initial_state() -> PaymentsState {
        PaymentsState::default().clean()
    }

    /// Stored state, or the initial state if there is none or it is unreadable
    pub fn load(&self) -> PaymentsState {
        let data = match self.inner.store.get_item(PAYMENTS_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => return Self::initial_state(),
            Err(e) => {
                log::warn!("Could not read local storage: {:#}", e);
                return Self::initial_state();
            }
        };

        match serde_json::from_str::<PaymentsState>(&data) {
            Ok(state) => state.clean(),
            Err(e) => {
                log::error!("Could not parse local storage data: {}", e);
                Self::initial_state()
            }
        }
    }

    /// Schedule a debounced write; the returned future must be driven
    pub fn save(&self, state: PaymentsState) -> LocalBoxFuture<'static, ()> {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        *self.inner.pending.borrow_mut() = Some(state);

        let inner = self.inner.clone();
        async move {
            inner.timer.sleep(inner.window).await;

            // Superseded by a later save
            if inner.generation.get() != generation {
                return;
            }
            inner.write_pending();
        }
        .boxed_local()
    }

    /// Write any pending state now, cancelling the scheduled write
    pub fn flush(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.write_pending();
    }
}

impl PaymentsStorageInner {
    fn write_pending(&self) {
        let pending = self.pending.borrow_mut().take();
        let Some(state) = pending else {
            return;
        };

        let data = match serde_json::to_string(&state.clean()) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Could not serialize payments state: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set_item(PAYMENTS_KEY, &data) {
            log::warn!("Could not write local storage: {:#}", e);
        }
    }
}

/// Payments storage as seen from the page's JavaScript
#[wasm_bindgen(js_name = PaymentsStorage)]
pub struct PaymentsStorageHandle {
    storage: PaymentsStorage,
}

#[wasm_bindgen(js_class = PaymentsStorage)]
impl PaymentsStorageHandle {
    /// `config` is the same optional JSON the background page takes
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<PaymentsStorageHandle, JsValue> {
        let config = crate::init_with_config(config.as_deref());

        let store = WindowLocalStorage::new()
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        let storage = PaymentsStorage::from_config(Rc::new(store), Rc::new(BrowserTimer), &config);
        Ok(Self { storage })
    }

    /// State as JSON text
    pub fn load(&self) -> String {
        serde_json::to_string(&self.storage.load()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn save(&self, json: &str) {
        match serde_json::from_str::<PaymentsState>(json) {
            Ok(state) => spawn_local(self.storage.save(state)),
            Err(e) => log::error!("Refusing to save malformed payments state: {}", e),
        }
    }

    pub fn flush(&self) {
        self.storage.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::PendingContribution;
    use crate::testing::{ImmediateTimer, MockLocalStore, RecordingTimer};

    fn storage(store: &Rc<MockLocalStore>) -> PaymentsStorage {
        PaymentsStorage::from_config(
            store.clone(),
            Rc::new(ImmediateTimer),
            &ExtensionConfig::default(),
        )
    }

    fn state(enabled: bool) -> PaymentsState {
        PaymentsState {
            rewards_enabled: enabled,
            ..Default::default()
        }
    }

    #[test]
    fn test_load_without_data_is_initial() {
        let store = Rc::new(MockLocalStore::default());
        assert_eq!(storage(&store).load(), PaymentsStorage::initial_state());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let store = Rc::new(MockLocalStore::default());
        store
            .items
            .borrow_mut()
            .insert(PAYMENTS_KEY.to_string(), "{\"rewardsEnabled\":".to_string());

        assert_eq!(storage(&store).load(), PaymentsStorage::initial_state());
    }

    #[test]
    fn test_read_failure_falls_back() {
        let store = Rc::new(MockLocalStore::default());
        store.fail.set(true);

        assert_eq!(storage(&store).load(), PaymentsStorage::initial_state());
    }

    #[test]
    fn test_load_cleans_state() {
        let store = Rc::new(MockLocalStore::default());
        store.items.borrow_mut().insert(
            PAYMENTS_KEY.to_string(),
            r#"{"rewardsEnabled":true,"pendingContributions":[{"amount":1}]}"#.to_string(),
        );

        let loaded = storage(&store).load();
        assert!(loaded.rewards_enabled);
        assert!(loaded.pending_contributions.is_empty());
    }

    #[tokio::test]
    async fn test_rapid_saves_coalesce() {
        let store = Rc::new(MockLocalStore::default());
        let storage = storage(&store);

        let first = storage.save(state(false));
        let second = storage.save(state(true));
        first.await;
        second.await;

        assert_eq!(store.writes.get(), 1);
        assert!(storage.load().rewards_enabled);
    }

    #[tokio::test]
    async fn test_saved_state_loads_back() {
        let store = Rc::new(MockLocalStore::default());
        let storage = storage(&store);

        let saved = PaymentsState {
            rewards_enabled: true,
            pending_contributions: vec![PendingContribution {
                publisher_key: "brave.com".to_string(),
                amount: 2.5,
                verified: true,
                ..Default::default()
            }],
        };
        storage.save(saved.clone()).await;

        assert_eq!(storage.load(), saved);
    }

    #[tokio::test]
    async fn test_flush_cancels_scheduled_write() {
        let store = Rc::new(MockLocalStore::default());
        let storage = storage(&store);

        let scheduled = storage.save(state(true));
        storage.flush();
        assert_eq!(store.writes.get(), 1);

        scheduled.await;
        assert_eq!(store.writes.get(), 1);
    }

    #[tokio::test]
    async fn test_configured_debounce_window_is_used() {
        let store = Rc::new(MockLocalStore::default());
        let timer = Rc::new(RecordingTimer::default());
        let config = ExtensionConfig::from_json(r#"{"saveDebounceMs":120}"#).unwrap();
        let storage = PaymentsStorage::from_config(store.clone(), timer.clone(), &config);

        storage.save(state(true)).await;

        assert_eq!(*timer.windows.borrow(), vec![Duration::from_millis(120)]);
        assert_eq!(store.writes.get(), 1);
    }

    #[tokio::test]
    async fn test_default_debounce_window() {
        let store = Rc::new(MockLocalStore::default());
        let timer = Rc::new(RecordingTimer::default());
        let storage =
            PaymentsStorage::from_config(store, timer.clone(), &ExtensionConfig::default());

        storage.save(state(false)).await;

        assert_eq!(
            *timer.windows.borrow(),
            vec![Duration::from_millis(crate::config::DEFAULT_SAVE_DEBOUNCE_MS)]
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let store = Rc::new(MockLocalStore::default());
        let storage = storage(&store);
        store.fail.set(true);

        storage.save(state(true)).await;
        assert_eq!(store.writes.get(), 0);
    }
}
