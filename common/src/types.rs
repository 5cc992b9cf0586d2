// Core trading update types - JSON-serializable wire shapes
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub price: f64,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub symbol: String,
    pub quantity: f64,
    pub average_price: f64,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub account_id: String,
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub free_margin: f64,
    pub timestamp: DateTime<Utc>,
}

/// Generic `{type, payload}` wrapper multiplexing the update shapes over a
/// single raw text channel. A missing `type` deserializes to an empty tag,
/// which no update kind matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// One update event, any kind. The fan-out unit for hub publishing and the
/// client's typed event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Price(PriceUpdate),
    Order(OrderUpdate),
    Position(PositionUpdate),
    Quote(QuoteUpdate),
    Account(AccountUpdate),
}

impl UpdateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateEvent::Price(_) => "price",
            UpdateEvent::Order(_) => "order",
            UpdateEvent::Position(_) => "position",
            UpdateEvent::Quote(_) => "quote",
            UpdateEvent::Account(_) => "account",
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope> {
        let payload = match self {
            UpdateEvent::Price(u) => serde_json::to_value(u)?,
            UpdateEvent::Order(u) => serde_json::to_value(u)?,
            UpdateEvent::Position(u) => serde_json::to_value(u)?,
            UpdateEvent::Quote(u) => serde_json::to_value(u)?,
            UpdateEvent::Account(u) => serde_json::to_value(u)?,
        };
        Ok(Envelope {
            kind: self.kind().to_string(),
            payload,
        })
    }

    /// Serializes the event to its wire form.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_envelope()?)?)
    }

    /// Decodes an envelope into a typed event. The tag match is
    /// case-insensitive; an unrecognized or missing tag yields `Ok(None)`
    /// and a payload that does not fit the tagged shape is an error the
    /// caller is expected to log and drop.
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<UpdateEvent>> {
        let event = match envelope.kind.to_ascii_lowercase().as_str() {
            "price" => UpdateEvent::Price(serde_json::from_value(envelope.payload.clone())?),
            "order" => UpdateEvent::Order(serde_json::from_value(envelope.payload.clone())?),
            "position" => UpdateEvent::Position(serde_json::from_value(envelope.payload.clone())?),
            "quote" => UpdateEvent::Quote(serde_json::from_value(envelope.payload.clone())?),
            "account" => UpdateEvent::Account(serde_json::from_value(envelope.payload.clone())?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// Metadata for one registered duplex-socket connection. Immutable once
/// created; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: String,
    pub connected_at: DateTime<Utc>,
    pub remote_endpoint: Option<String>,
}
