// Background page logic for the rewards extension
// Built as its own bundle; all state lives in Rust, JavaScript is just glue
// that forwards chrome.runtime events to a `Background` instance

use rewards_extension::services::host_apis;
use rewards_extension::{Dispatch, Message, NotificationController};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

// Dummy main for binary target
fn main() {}

/// One per background page, created by the glue at load time
#[wasm_bindgen]
pub struct Background {
    controller: NotificationController,
}

#[wasm_bindgen]
impl Background {
    /// `config` is optional JSON, see `ExtensionConfig`
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Background {
        let config = rewards_extension::init_with_config(config.as_deref());

        let controller = NotificationController::new(host_apis(), config);
        controller.init();

        log::info!("🚀 Rewards background initialized (Rust core)");
        Background { controller }
    }

    /// `runtime.onInstalled`, with `details.reason`
    #[wasm_bindgen(js_name = onInstalled)]
    pub fn on_installed(&self, reason: String) -> js_sys::Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller.on_installed(&reason).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// `runtime.onStartup`
    #[wasm_bindgen(js_name = onStartup)]
    pub fn on_startup(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller.on_startup().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// `runtime.onConnect`; the glue calls `onDisconnect` from the port
    #[wasm_bindgen(js_name = onConnect)]
    pub fn on_connect(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller.on_connect().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = onDisconnect)]
    pub fn on_disconnect(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller.on_disconnect().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// `runtime.onMessage`; the return value is the listener's return value
    #[wasm_bindgen(js_name = onMessage)]
    pub fn on_message(&self, message: JsValue, send_response: js_sys::Function) -> bool {
        let message = to_message(&message);
        log::debug!("Received message {:?}", message.tag());

        match self.controller.on_message(message) {
            Dispatch::NoResponse(work) => {
                if let Some(work) = work {
                    spawn_local(work);
                }
                false
            }
            Dispatch::Deferred(reply) => {
                spawn_local(async move {
                    let response = reply.await;
                    let reply = serde_json::to_string(&response)
                        .map_err(|e| JsValue::from_str(&e.to_string()))
                        .and_then(|text| js_sys::JSON::parse(&text));

                    let sent = reply.and_then(|value| send_response.call1(&JsValue::NULL, &value));
                    if let Err(e) = sent {
                        log::warn!("Failed to send response: {:?}", e);
                    }
                });
                true
            }
        }
    }
}

/// Runtime messages arrive as strings or plain objects
fn to_message(message: &JsValue) -> Message {
    if let Some(tag) = message.as_string() {
        return Message::parse(Value::String(tag));
    }
    // JSON.stringify(undefined) is undefined, not a string
    if message.is_undefined() || message.is_null() {
        return Message::parse(Value::Null);
    }

    match js_sys::JSON::stringify(message) {
        Ok(text) => Message::from_json(&String::from(text)),
        Err(e) => {
            log::warn!("Unserializable runtime message: {:?}", e);
            Message::parse(Value::Null)
        }
    }
}
