use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized webhook event type: {0:?}")]
pub struct UnknownEventType(pub String);

/// SUBHOOK event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The send request was accepted.
    Request,
    Delivered,
    Dropped,
    Sending,
    /// Mobile-originated reply from a recipient.
    Mo,
    TemplateAccept,
    TemplateReject,
}

impl EventType {
    pub const ALL: [Self; 7] = [
        Self::Request,
        Self::Delivered,
        Self::Dropped,
        Self::Sending,
        Self::Mo,
        Self::TemplateAccept,
        Self::TemplateReject,
    ];

    /// Wire value of the `event` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Delivered => "delivered",
            Self::Dropped => "dropped",
            Self::Sending => "sending",
            Self::Mo => "mo",
            Self::TemplateAccept => "template_accept",
            Self::TemplateReject => "template_reject",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Request => "send request accepted",
            Self::Delivered => "message delivered",
            Self::Dropped => "message delivery failed",
            Self::Sending => "message is being sent",
            Self::Mo => "reply received from recipient",
            Self::TemplateAccept => "template approved",
            Self::TemplateReject => "template rejected",
        }
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_owned()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `request`, `delivered`, `dropped` and `sending`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsEvent {
    pub send_id: String,
    pub to: String,
    pub content: String,
    pub status: String,
    pub fee: i64,
    pub send_at: i64,
    pub report_at: i64,
}

impl SmsEvent {
    pub fn from_data(data: &Map<String, Value>) -> Self {
        Self {
            send_id: text(data, "send_id"),
            to: text(data, "to"),
            content: text(data, "content"),
            status: text(data, "status"),
            fee: integer(data, "fee"),
            send_at: integer(data, "send_at"),
            report_at: integer(data, "report_at"),
        }
    }
}

/// Payload of `mo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoEvent {
    pub from: String,
    pub content: String,
    /// The outbound message being replied to.
    pub sms_content: String,
    pub reply_at: i64,
}

impl MoEvent {
    pub fn from_data(data: &Map<String, Value>) -> Self {
        Self {
            from: text(data, "from"),
            content: text(data, "content"),
            sms_content: text(data, "sms_content"),
            reply_at: integer(data, "reply_at"),
        }
    }
}

/// Payload of `template_accept` and `template_reject`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEvent {
    pub template_id: String,
    pub status: String,
    pub reason: String,
}

impl TemplateEvent {
    pub fn from_data(data: &Map<String, Value>) -> Self {
        Self {
            template_id: text(data, "template_id"),
            status: text(data, "status"),
            reason: text(data, "reason"),
        }
    }
}

/// A decoded SUBHOOK event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Request(SmsEvent),
    Delivered(SmsEvent),
    Dropped(SmsEvent),
    Sending(SmsEvent),
    Mo(MoEvent),
    TemplateAccept(TemplateEvent),
    TemplateReject(TemplateEvent),
}

impl WebhookEvent {
    /// Decode `data` as the payload of `event_type`.
    ///
    /// Decoding is permissive: missing or mistyped fields keep their zero value.
    pub fn decode(event_type: EventType, data: &Map<String, Value>) -> Self {
        match event_type {
            EventType::Request => Self::Request(SmsEvent::from_data(data)),
            EventType::Delivered => Self::Delivered(SmsEvent::from_data(data)),
            EventType::Dropped => Self::Dropped(SmsEvent::from_data(data)),
            EventType::Sending => Self::Sending(SmsEvent::from_data(data)),
            EventType::Mo => Self::Mo(MoEvent::from_data(data)),
            EventType::TemplateAccept => Self::TemplateAccept(TemplateEvent::from_data(data)),
            EventType::TemplateReject => Self::TemplateReject(TemplateEvent::from_data(data)),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::Request(_) => EventType::Request,
            Self::Delivered(_) => EventType::Delivered,
            Self::Dropped(_) => EventType::Dropped,
            Self::Sending(_) => EventType::Sending,
            Self::Mo(_) => EventType::Mo,
            Self::TemplateAccept(_) => EventType::TemplateAccept,
            Self::TemplateReject(_) => EventType::TemplateReject,
        }
    }

    pub fn as_sms(&self) -> Option<&SmsEvent> {
        match self {
            Self::Request(sms) | Self::Delivered(sms) | Self::Dropped(sms) | Self::Sending(sms) => {
                Some(sms)
            }
            _ => None,
        }
    }

    pub fn as_mo(&self) -> Option<&MoEvent> {
        match self {
            Self::Mo(mo) => Some(mo),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateEvent> {
        match self {
            Self::TemplateAccept(template) | Self::TemplateReject(template) => Some(template),
            _ => None,
        }
    }
}

fn text(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(value)) => value.clone(),
        _ => String::new(),
    }
}

fn integer(data: &Map<String, Value>, key: &str) -> i64 {
    match data.get(key) {
        Some(Value::String(value)) => value.trim().parse().unwrap_or(0),
        Some(Value::Number(value)) => value.as_i64().unwrap_or(0),
        _ => 0,
    }
}
