use tracing::{debug, warn};

use super::{DispatchError, Dispatcher, WebhookEnvelope, WebhookError};
use crate::domain::WebhookKey;

/// HTTP answer for a SUBHOOK delivery, independent of any web framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

impl From<&WebhookError> for WebhookResponse {
    fn from(err: &WebhookError) -> Self {
        match err {
            WebhookError::MalformedPayload { .. } => Self::new(400, err.to_string()),
            WebhookError::SignatureMismatch => Self::new(403, "signature verification failed"),
            WebhookError::Dispatch(DispatchError::UnrecognizedEventType(_)) => {
                Self::new(400, err.to_string())
            }
            WebhookError::Dispatch(DispatchError::Handler(_)) => {
                Self::new(500, "event handling failed")
            }
        }
    }
}

/// Verifies and dispatches SUBHOOK deliveries for one webhook secret.
///
/// Wire it into any HTTP server by passing the request method and raw body to
/// [`WebhookEndpoint::handle`] and writing back the returned status and body.
#[derive(Debug)]
pub struct WebhookEndpoint {
    key: WebhookKey,
    dispatcher: Dispatcher,
}

impl WebhookEndpoint {
    pub fn new(key: WebhookKey, dispatcher: Dispatcher) -> Self {
        Self { key, dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// `200 OK` on success, `400` for non-POST requests, unparsable bodies and
    /// unknown event types, `403` for a bad signature and `500` when the
    /// handler fails.
    ///
    /// Unknown event types differ from SUBMAIL's own SDKs, which answer them
    /// with `500`. A signed delivery of a type this crate does not model is a
    /// malformed request, not a server fault, so it gets `400`.
    pub fn handle(&self, method: &str, body: &[u8]) -> WebhookResponse {
        match self.process(method, body) {
            Ok(envelope) => {
                debug!(event = %envelope.event, app_id = %envelope.app_id, "webhook delivery handled");
                WebhookResponse::new(200, "OK")
            }
            Err(err) => {
                let response = WebhookResponse::from(&err);
                warn!(status = response.status, error = %err, "webhook delivery rejected");
                response
            }
        }
    }

    /// Parse, verify and dispatch, returning the accepted envelope.
    pub fn process(&self, method: &str, body: &[u8]) -> Result<WebhookEnvelope, WebhookError> {
        if method != "POST" {
            return Err(WebhookError::MalformedPayload {
                reason: format!("expected POST, got {method}"),
            });
        }
        let envelope = WebhookEnvelope::parse_form(body)?;
        envelope.verify(&self.key)?;
        self.dispatcher.dispatch(&envelope)?;
        Ok(envelope)
    }
}
