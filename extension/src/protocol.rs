// Background message protocol
// Requests sent by the tip panel and content scripts, and the replies

use std::fmt;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DONATE_TO_TWITTER_USER: &str = "donateToTwitterUser";
pub const REWARDS_ENABLED: &str = "rewardsEnabled";

/// Tip request payload, forwarded verbatim to the rewards API
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwitterTip {
    pub user_id: String,
    pub name: String,
    pub screen_name: String,
    pub tweet_text: String,
}

/// Inbound request
///
/// On the wire a message is either a bare tag (`"rewardsEnabled"`) or an
/// object `{ "type": <tag>, ...payload }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    DonateToTwitterUser(TwitterTip),
    RewardsEnabled,
    /// Unrecognised tag, or a known tag with an unusable payload
    Unknown(String),
}

impl Message {
    /// Never fails: anything that is not a well-formed known request is `Unknown`
    pub fn parse(raw: Value) -> Self {
        let tag = match &raw {
            Value::String(tag) => tag.clone(),
            Value::Object(map) => match map.get("type").and_then(Value::as_str) {
                Some(tag) => tag.to_string(),
                None => return Message::Unknown(String::new()),
            },
            _ => return Message::Unknown(String::new()),
        };

        match tag.as_str() {
            REWARDS_ENABLED => Message::RewardsEnabled,
            DONATE_TO_TWITTER_USER => match serde_json::from_value::<TwitterTip>(raw) {
                Ok(tip) => Message::DonateToTwitterUser(tip),
                Err(e) => {
                    log::warn!("Ignoring {} with malformed payload: {}", tag, e);
                    Message::Unknown(tag)
                }
            },
            _ => Message::Unknown(tag),
        }
    }

    /// Parse from JSON text; unparseable text is an unknown message
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(raw) => Self::parse(raw),
            Err(e) => {
                log::warn!("Ignoring message that is not JSON: {}", e);
                Message::Unknown(String::new())
            }
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Message::DonateToTwitterUser(_) => DONATE_TO_TWITTER_USER,
            Message::RewardsEnabled => REWARDS_ENABLED,
            Message::Unknown(tag) => tag,
        }
    }
}

/// Reply to `rewardsEnabled`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardsEnabledResponse {
    pub enabled: bool,
}

/// What the message dispatcher should do with the channel
pub enum Dispatch {
    /// Reply nothing; optional fire-and-forget work still has to be driven
    NoResponse(Option<LocalBoxFuture<'static, ()>>),
    /// Keep the channel open and reply with the future's output
    Deferred(LocalBoxFuture<'static, RewardsEnabledResponse>),
}

impl Dispatch {
    pub fn none() -> Self {
        Dispatch::NoResponse(None)
    }

    /// The value a `runtime.onMessage` listener must return
    pub fn keeps_channel_open(&self) -> bool {
        matches!(self, Dispatch::Deferred(_))
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::NoResponse(work) => f
                .debug_tuple("NoResponse")
                .field(&work.as_ref().map(|_| "<pending>"))
                .finish(),
            Dispatch::Deferred(_) => f.debug_tuple("Deferred").field(&"<pending>").finish(),
        }
    }
}
