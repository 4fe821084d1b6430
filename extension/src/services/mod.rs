// Browser-side implementations of the host traits

pub mod chrome;
pub mod storage;

use anyhow::anyhow;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

pub use chrome::{host_apis, BraveRewards, ChromeBadge, ChromeTabs};
pub use storage::{BrowserTimer, ChromeLocalStorage, PaymentsStorage, Timer, WindowLocalStorage};

/// JS exceptions carry no Rust error type; keep their debug form
pub(crate) fn js_error(value: JsValue) -> anyhow::Error {
    anyhow!("{:?}", value)
}

/// Turn a callback-style chrome call into a future
///
/// `call` receives the callback to hand to the host API. The future rejects
/// on a synchronous throw, and when the host reports failure through
/// `chrome.runtime.lastError`.
pub(crate) fn with_callback<F>(call: F) -> JsFuture
where
    F: FnOnce(&js_sys::Function) -> Result<(), JsValue>,
{
    let mut call = Some(call);
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let Some(call) = call.take() else {
            return;
        };

        let on_failure = reject.clone();
        let callback = Closure::once_into_js(move |value: JsValue| {
            match settle(value, last_error()) {
                Ok(value) => {
                    let _ = resolve.call1(&JsValue::NULL, &value);
                }
                Err(message) => {
                    let _ = on_failure.call1(&JsValue::NULL, &JsValue::from_str(&message));
                }
            }
        });

        if let Err(e) = call(callback.unchecked_ref()) {
            let _ = reject.call1(&JsValue::NULL, &e);
        }
    });
    JsFuture::from(promise)
}

/// A set `lastError` wins over whatever the callback received
fn settle<T>(value: T, last_error: Option<String>) -> Result<T, String> {
    match last_error {
        Some(message) => Err(message),
        None => Ok(value),
    }
}

/// `chrome.runtime.lastError.message`, read inside a host callback
fn last_error() -> Option<String> {
    let runtime = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))
        .and_then(|chrome| js_sys::Reflect::get(&chrome, &JsValue::from_str("runtime")))
        .ok()?;
    let error = js_sys::Reflect::get(&runtime, &JsValue::from_str("lastError")).ok()?;
    if error.is_undefined() || error.is_null() {
        return None;
    }

    let message = js_sys::Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string());
    Some(message.unwrap_or_else(|| format!("{:?}", error)))
}
