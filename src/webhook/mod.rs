//! Inbound SUBHOOK deliveries.
//!
//! SUBMAIL posts events as `application/x-www-form-urlencoded` bodies carrying
//! `token`, `signature`, `event`, `appid`, `timestamp` and event-specific
//! fields. A delivery is authentic when `signature == hex(md5(token + key))`,
//! where `key` is the secret issued when the webhook was registered.
//!
//! ```rust
//! use submail::webhook::{Dispatcher, WebhookEndpoint};
//! use submail::WebhookKey;
//!
//! let dispatcher = Dispatcher::new().on_delivered(|_envelope, sms| {
//!     println!("{} delivered to {}", sms.send_id, sms.to);
//!     Ok(())
//! });
//! let endpoint = WebhookEndpoint::new(WebhookKey::new("hook-secret").unwrap(), dispatcher);
//! let response = endpoint.handle("GET", b"");
//! assert_eq!(response.status, 400);
//! ```

mod dispatch;
mod endpoint;
mod events;

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use crate::domain::{AppId, UnixTimestamp, WebhookKey};
use crate::signing::{SIGNATURE_FIELD, SignAlgorithm};

pub use dispatch::{DispatchError, Dispatcher, HandlerError};
pub use endpoint::{WebhookEndpoint, WebhookResponse};
pub use events::{EventType, MoEvent, SmsEvent, TemplateEvent, UnknownEventType, WebhookEvent};

const TOKEN_FIELD: &str = "token";
const EVENT_FIELD: &str = "event";
const RESERVED_FIELDS: [&str; 5] = [
    TOKEN_FIELD,
    SIGNATURE_FIELD,
    EVENT_FIELD,
    AppId::FIELD,
    UnixTimestamp::FIELD,
];

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("malformed webhook payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("webhook signature mismatch")]
    SignatureMismatch,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Check a delivery's `signature` against `hex(md5(token + key))`.
///
/// Returns `false` when any input is empty. Hex case is ignored and the
/// comparison runs in constant time over the lowercased bytes.
pub fn verify_signature(token: &str, signature: &str, key: &str) -> bool {
    if token.is_empty() || signature.is_empty() || key.is_empty() {
        return false;
    }
    let expected = SignAlgorithm::Md5.hex_digest(&format!("{token}{key}"));
    let provided = signature.to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[derive(Debug, Clone, PartialEq)]
/// A parsed SUBHOOK delivery.
pub struct WebhookEnvelope {
    pub token: String,
    pub signature: String,
    pub event: String,
    pub app_id: String,
    /// `0` when absent or not an integer.
    pub timestamp: i64,
    /// Every other field; repeated fields become JSON arrays of strings.
    pub data: Map<String, Value>,
}

impl WebhookEnvelope {
    /// Parse a form-encoded request body.
    ///
    /// Both the raw body and every percent-decoded name and value must be
    /// valid UTF-8.
    pub fn parse_form(body: &[u8]) -> Result<Self, WebhookError> {
        let body = std::str::from_utf8(body).map_err(|err| WebhookError::MalformedPayload {
            reason: format!("body is not valid UTF-8: {err}"),
        })?;
        let pairs = body
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
                Ok((decode_form_component(name)?, decode_form_component(value)?))
            })
            .collect::<Result<Vec<_>, WebhookError>>()?;
        Ok(Self::from_pairs(pairs))
    }

    /// Build an envelope from already-decoded form pairs.
    ///
    /// Reserved fields keep their first value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut reserved = Map::<String, Value>::new();
        let mut grouped = Vec::<(String, Vec<String>)>::new();
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            if RESERVED_FIELDS.contains(&key.as_str()) {
                reserved.entry(key).or_insert(Value::String(value));
                continue;
            }
            match grouped.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, values)) => values.push(value),
                None => grouped.push((key, vec![value])),
            }
        }

        let field = |name: &str| {
            reserved
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        let data = grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    Value::String(values.remove(0))
                } else {
                    Value::Array(values.into_iter().map(Value::String).collect())
                };
                (key, value)
            })
            .collect();

        Self {
            token: field(TOKEN_FIELD),
            signature: field(SIGNATURE_FIELD),
            event: field(EVENT_FIELD),
            app_id: field(AppId::FIELD),
            timestamp: field(UnixTimestamp::FIELD).trim().parse().unwrap_or(0),
            data,
        }
    }

    /// Verify this delivery against the webhook secret.
    pub fn verify(&self, key: &WebhookKey) -> Result<(), WebhookError> {
        if verify_signature(&self.token, &self.signature, key.as_str()) {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }

    pub fn event_type(&self) -> Result<EventType, UnknownEventType> {
        self.event.parse()
    }
}

/// `application/x-www-form-urlencoded` decoding: `+` is a space, then percent escapes.
fn decode_form_component(raw: &str) -> Result<String, WebhookError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|err| WebhookError::MalformedPayload {
            reason: format!("{raw:?} does not decode to UTF-8: {err}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_signature_matches_md5_of_token_and_key() {
        // md5("abc")
        assert!(verify_signature("a", "900150983cd24fb0d6963f7d28e17f72", "bc"));
        assert!(verify_signature("a", "900150983CD24FB0D6963F7D28E17F72", "bc"));
        assert!(!verify_signature("a", "900150983cd24fb0d6963f7d28e17f73", "bc"));
        assert!(!verify_signature("a", "900150983cd24fb0", "bc"));
    }

    #[test]
    fn verify_signature_rejects_empty_inputs() {
        let signature = SignAlgorithm::Md5.hex_digest("tokkey");
        assert!(verify_signature("tok", &signature, "key"));
        assert!(!verify_signature("", &signature, "key"));
        assert!(!verify_signature("tok", "", "key"));
        assert!(!verify_signature("tok", &signature, ""));
    }

    #[test]
    fn parse_form_splits_reserved_fields_from_data() {
        let body = b"token=t0k&signature=abc&event=delivered&appid=112455&timestamp=1700000000\
&send_id=x1&to=13800138000&fee=1";
        let envelope = WebhookEnvelope::parse_form(body).unwrap();

        assert_eq!(envelope.token, "t0k");
        assert_eq!(envelope.signature, "abc");
        assert_eq!(envelope.event, "delivered");
        assert_eq!(envelope.app_id, "112455");
        assert_eq!(envelope.timestamp, 1_700_000_000);
        assert_eq!(envelope.data.len(), 3);
        assert_eq!(envelope.data["send_id"], Value::String("x1".to_owned()));
        assert!(!envelope.data.contains_key("token"));
        assert_eq!(envelope.event_type(), Ok(EventType::Delivered));
    }

    #[test]
    fn repeated_fields_become_lists() {
        let envelope = WebhookEnvelope::parse_form(b"event=mo&tag=a&tag=b&content=hi%20there").unwrap();
        assert_eq!(
            envelope.data["tag"],
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
        assert_eq!(envelope.data["content"], Value::String("hi there".into()));
    }

    #[test]
    fn missing_or_invalid_timestamp_is_zero() {
        let envelope = WebhookEnvelope::parse_form(b"event=mo").unwrap();
        assert_eq!(envelope.timestamp, 0);
        assert_eq!(envelope.token, "");

        let envelope = WebhookEnvelope::parse_form(b"timestamp=soon").unwrap();
        assert_eq!(envelope.timestamp, 0);
    }

    #[test]
    fn non_utf8_body_is_malformed() {
        assert!(matches!(
            WebhookEnvelope::parse_form(&[0x66, 0xff, 0x3d]),
            Err(WebhookError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn escaped_invalid_utf8_is_malformed() {
        let bodies: [&[u8]; 3] = [
            b"token=%FF&signature=abc&event=mo",
            b"%C3%28=1",
            b"event=mo&content=%E4%B8",
        ];
        for body in bodies {
            assert!(
                matches!(
                    WebhookEnvelope::parse_form(body),
                    Err(WebhookError::MalformedPayload { .. })
                ),
                "{:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn form_escapes_decode_like_a_browser_form() {
        let body = "content=%E4%BD%A0%E5%A5%BD+world&&flag&note=a%2Bb=c";
        let envelope = WebhookEnvelope::parse_form(body.as_bytes()).unwrap();
        assert_eq!(envelope.data["content"], Value::String("你好 world".into()));
        assert_eq!(envelope.data["flag"], Value::String(String::new()));
        assert_eq!(envelope.data["note"], Value::String("a+b=c".into()));
    }

    #[test]
    fn verify_uses_the_webhook_key() {
        let key = WebhookKey::new("hook-secret").unwrap();
        let signature = SignAlgorithm::Md5.hex_digest("t0khook-secret");
        let envelope = WebhookEnvelope::from_pairs([("token", "t0k"), ("signature", signature.as_str())]);
        assert!(envelope.verify(&key).is_ok());

        let forged = WebhookEnvelope::from_pairs([("token", "t0k"), ("signature", "0000")]);
        assert!(matches!(
            forged.verify(&key),
            Err(WebhookError::SignatureMismatch)
        ));
    }
}
