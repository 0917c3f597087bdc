//! Serde model of the slice of Telegram's update envelope the gateway reads.
//!
//! Everything below `update_id` is optional on purpose: Telegram sends many update kinds this
//! gateway does not care about (edits, stickers, joins), and "field missing" must decode cleanly
//! into a no-op rather than a deserialization error.
use chrono::{DateTime, TimeZone, Utc};
use diamond_match_engine::db_types::RequesterInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub chat: Option<TelegramChat>,
    /// Unix seconds, as the platform sends it.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TelegramMessage {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.date.and_then(|secs| Utc.timestamp_opt(secs, 0).single()).unwrap_or_else(Utc::now)
    }

    /// The deep-link parameter of a `/start <parameter>` command, if this message is one.
    /// A bare `/start` has no parameter and returns `None`.
    pub fn start_parameter(&self) -> Option<&str> {
        let rest = self.text.as_deref()?.strip_prefix("/start ")?;
        let parameter = rest.trim();
        (!parameter.is_empty()).then_some(parameter)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<&TelegramUser> for RequesterInfo {
    fn from(user: &TelegramUser) -> Self {
        RequesterInfo {
            telegram_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(default, rename = "type")]
    pub chat_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl TelegramChat {
    pub fn is_private(&self) -> bool {
        self.chat_type.as_deref() == Some("private")
    }
}
