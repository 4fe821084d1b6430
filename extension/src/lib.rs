// Rewards extension core, compiled to WASM
// The background controller and the payments page storage live here; the
// JavaScript side only forwards chrome events

use std::sync::Once;

pub mod config;
pub mod controller;
pub mod host;
pub mod payments;
pub mod protocol;
pub mod services;

#[cfg(test)]
mod testing;

pub use config::ExtensionConfig;
pub use controller::{HostApis, NotificationController, NotificationState};
pub use protocol::{Dispatch, Message, RewardsEnabledResponse, TwitterTip};

static LOGGER: Once = Once::new();

/// Route `log` to the browser console; later calls are no-ops
pub fn init_logging(level: log::Level) {
    LOGGER.call_once(|| wasm_logger::init(wasm_logger::Config::new(level)));
}

/// Parse the page's config and start logging at its level
///
/// Falls back to the default config on bad JSON; the warning is logged once
/// the logger is up.
pub fn init_with_config(text: Option<&str>) -> ExtensionConfig {
    configure(text, init_logging)
}

fn configure(text: Option<&str>, start_logging: impl FnOnce(log::Level)) -> ExtensionConfig {
    let parsed = ExtensionConfig::from_optional_json(text);
    let config = parsed.as_ref().cloned().unwrap_or_default();

    start_logging(config.log_level());

    if let Err(e) = parsed {
        log::warn!("Using default config: {:#}", e);
    }
    config
}
