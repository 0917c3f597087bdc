use chrono::{DateTime, Utc};
use dmg_common::Usd;
use log::error;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------   DiamondShape     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiamondShape {
    Round,
    Princess,
    Cushion,
    Emerald,
    Oval,
    Radiant,
    Asscher,
    Marquise,
    Heart,
    Pear,
}

/// The shape vocabulary in matching order. The extractor takes the FIRST shape whose token occurs
/// in the message, so this ordering is part of the parsing contract and must not be derived from
/// any map's iteration order.
pub const SHAPE_VOCABULARY: [DiamondShape; 10] = [
    DiamondShape::Round,
    DiamondShape::Princess,
    DiamondShape::Cushion,
    DiamondShape::Emerald,
    DiamondShape::Oval,
    DiamondShape::Radiant,
    DiamondShape::Asscher,
    DiamondShape::Marquise,
    DiamondShape::Heart,
    DiamondShape::Pear,
];

impl DiamondShape {
    pub fn token(&self) -> &'static str {
        match self {
            DiamondShape::Round => "round",
            DiamondShape::Princess => "princess",
            DiamondShape::Cushion => "cushion",
            DiamondShape::Emerald => "emerald",
            DiamondShape::Oval => "oval",
            DiamondShape::Radiant => "radiant",
            DiamondShape::Asscher => "asscher",
            DiamondShape::Marquise => "marquise",
            DiamondShape::Heart => "heart",
            DiamondShape::Pear => "pear",
        }
    }
}

impl Display for DiamondShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for DiamondShape {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SHAPE_VOCABULARY
            .into_iter()
            .find(|shape| shape.token() == wanted)
            .ok_or_else(|| ConversionError("diamond shape", s.to_string()))
    }
}

//--------------------------------------    ColorGrade      ----------------------------------------------------------
/// GIA color grades the group trades in. Anything past M is lumped into "don't care" upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorGrade {
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
}

impl ColorGrade {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'd' => Some(ColorGrade::D),
            'e' => Some(ColorGrade::E),
            'f' => Some(ColorGrade::F),
            'g' => Some(ColorGrade::G),
            'h' => Some(ColorGrade::H),
            'i' => Some(ColorGrade::I),
            'j' => Some(ColorGrade::J),
            'k' => Some(ColorGrade::K),
            'l' => Some(ColorGrade::L),
            'm' => Some(ColorGrade::M),
            _ => None,
        }
    }
}

impl Display for ColorGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for ColorGrade {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ColorGrade::from_letter(c).ok_or_else(|| ConversionError("color grade", s.to_string())),
            _ => Err(ConversionError("color grade", s.to_string())),
        }
    }
}

//--------------------------------------   ClarityGrade     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClarityGrade {
    Fl,
    If,
    Vvs1,
    Vvs2,
    Vs1,
    Vs2,
    Si1,
    Si2,
    Si3,
    I1,
    I2,
    I3,
}

/// The clarity vocabulary in matching order. The extractor takes the FIRST grade whose token is
/// contained in the message; "si1" is therefore tested before "si2", and both before the bare "i1"
/// that they contain. Reordering this list changes parsing behaviour.
pub const CLARITY_VOCABULARY: [ClarityGrade; 12] = [
    ClarityGrade::Fl,
    ClarityGrade::If,
    ClarityGrade::Vvs1,
    ClarityGrade::Vvs2,
    ClarityGrade::Vs1,
    ClarityGrade::Vs2,
    ClarityGrade::Si1,
    ClarityGrade::Si2,
    ClarityGrade::Si3,
    ClarityGrade::I1,
    ClarityGrade::I2,
    ClarityGrade::I3,
];

impl ClarityGrade {
    pub fn token(&self) -> &'static str {
        match self {
            ClarityGrade::Fl => "fl",
            ClarityGrade::If => "if",
            ClarityGrade::Vvs1 => "vvs1",
            ClarityGrade::Vvs2 => "vvs2",
            ClarityGrade::Vs1 => "vs1",
            ClarityGrade::Vs2 => "vs2",
            ClarityGrade::Si1 => "si1",
            ClarityGrade::Si2 => "si2",
            ClarityGrade::Si3 => "si3",
            ClarityGrade::I1 => "i1",
            ClarityGrade::I2 => "i2",
            ClarityGrade::I3 => "i3",
        }
    }
}

impl Display for ClarityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token().to_uppercase())
    }
}

impl FromStr for ClarityGrade {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CLARITY_VOCABULARY
            .into_iter()
            .find(|grade| grade.token() == wanted)
            .ok_or_else(|| ConversionError("clarity grade", s.to_string()))
    }
}

//--------------------------------------  DiamondRequest    ----------------------------------------------------------
/// The minimum confidence an extracted request needs before the matching pipeline is invoked.
/// The gate is inclusive: a request scoring exactly this value proceeds to matching.
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// A structured interpretation of a free-text buyer inquiry. Derived per inbound message and never
/// persisted; everything worth keeping ends up in notification metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiamondRequest {
    pub shape: Option<DiamondShape>,
    pub carat_min: Option<f64>,
    pub carat_max: Option<f64>,
    pub color: Option<ColorGrade>,
    pub clarity: Option<ClarityGrade>,
    pub price_max: Option<Usd>,
    /// Tags recording which fields were detected, in detection order.
    pub keywords: Vec<String>,
    /// Additive score. Each detected field contributes its fixed weight; the sum is deliberately
    /// NOT clamped to 1.0. Treat it as a ranking signal, not a probability.
    pub confidence: f64,
}

impl DiamondRequest {
    pub fn is_actionable(&self) -> bool {
        self.confidence >= CONFIDENCE_THRESHOLD
    }
}

//--------------------------------------  InventoryItem     ----------------------------------------------------------
/// One stone from a dealer's inventory snapshot, with the grade fields already parsed. Grades the
/// backend reports in a form we don't recognize degrade to `None` and simply never score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub stock_number: Option<String>,
    pub shape: Option<DiamondShape>,
    pub weight: f64,
    pub color: Option<ColorGrade>,
    pub clarity: Option<ClarityGrade>,
    pub price_per_carat: f64,
}

impl InventoryItem {
    pub fn total_price(&self) -> f64 {
        self.price_per_carat * self.weight
    }
}

//--------------------------------------    DealerMatch     ----------------------------------------------------------
/// A dealer paired with the subset of their inventory satisfying a request. `matched_items` is in
/// inventory-snapshot order and holds at most [`crate::MAX_MATCHED_ITEMS`] entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerMatch {
    pub dealer_telegram_id: i64,
    pub matched_items: Vec<InventoryItem>,
}

//--------------------------------------      Dealer        ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealer {
    pub telegram_id: i64,
    pub name: Option<String>,
}

//--------------------------------------    MessageType     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    GroupDiamondRequest,
    DiamondPostGenerated,
    CtaClick,
}

impl Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageType::GroupDiamondRequest => "group_diamond_request",
            MessageType::DiamondPostGenerated => "diamond_post_generated",
            MessageType::CtaClick => "cta_click",
        };
        f.write_str(s)
    }
}

impl FromStr for MessageType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group_diamond_request" => Ok(Self::GroupDiamondRequest),
            "diamond_post_generated" => Ok(Self::DiamondPostGenerated),
            "cta_click" => Ok(Self::CtaClick),
            _ => Err(ConversionError("message type", s.to_string())),
        }
    }
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid message type in store: {value}. Defaulting to group_diamond_request");
            MessageType::GroupDiamondRequest
        })
    }
}

//--------------------------------------  NotificationStatus  --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

//--------------------------------------   RequesterInfo    ----------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    pub telegram_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl RequesterInfo {
    /// A human-readable handle for notification text: full name if we have one, else @username,
    /// else the numeric id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.as_ref().map(|u| format!("@{u}")).unwrap_or_else(|| self.telegram_id.to_string()),
        }
    }
}

//--------------------------------------   RequestContext   ----------------------------------------------------------
/// Everything about the inbound update that the dispatcher folds into notification metadata.
/// Request-scoped; nothing here outlives the webhook call that produced it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub update_id: i64,
    pub requester: RequesterInfo,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub original_message: String,
    pub message_timestamp: DateTime<Utc>,
}

//--------------------------------------  NewNotification   ----------------------------------------------------------
/// A notification row about to be inserted. Written exactly once per dealer per qualifying inbound
/// message and handed off to the (external) delivery pipeline; the engine never reads it back.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub telegram_id: i64,
    pub message_type: MessageType,
    pub message_content: String,
    pub metadata: serde_json::Value,
    pub status: NotificationStatus,
    /// When set, the store enforces uniqueness on this key, so a platform-side redelivery of the
    /// same update cannot produce a second row for the same dealer. When `None` (the default),
    /// redelivery WILL duplicate notifications.
    pub idempotency_key: Option<String>,
}

impl NewNotification {
    pub fn for_dealer_match(request: &DiamondRequest, dealer_match: &DealerMatch, ctx: &RequestContext) -> Self {
        let where_from = ctx.chat_title.clone().unwrap_or_else(|| "the trading group".to_string());
        let message_content = format!(
            "💎 {} is looking for a stone in {}: \"{}\". {} of your stones match.",
            ctx.requester.display_name(),
            where_from,
            ctx.original_message,
            dealer_match.matched_items.len(),
        );
        let metadata = serde_json::json!({
            "originalMessage": ctx.original_message,
            "requester": ctx.requester,
            "chat": { "id": ctx.chat_id, "title": ctx.chat_title },
            "matchedItems": dealer_match.matched_items,
            "confidenceScore": request.confidence,
            "requestDetails": request,
            "messageTimestamp": ctx.message_timestamp,
        });
        Self {
            telegram_id: dealer_match.dealer_telegram_id,
            message_type: MessageType::GroupDiamondRequest,
            message_content,
            metadata,
            status: NotificationStatus::default(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: String) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

//--------------------------------------    NewCtaClick     ----------------------------------------------------------
/// A deep-link click recorded when a user opens the bot privately via `/start <parameter>`.
/// Feeds the (out-of-scope) campaign dashboards; nothing in the matching pipeline reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCtaClick {
    pub telegram_id: i64,
    pub parameter: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
}
