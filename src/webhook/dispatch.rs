use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use tracing::debug;

use super::WebhookEnvelope;
use super::events::{EventType, MoEvent, SmsEvent, TemplateEvent, UnknownEventType, WebhookEvent};

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

type Handler =
    Box<dyn Fn(&WebhookEnvelope, &WebhookEvent) -> Result<(), HandlerError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnrecognizedEventType(#[from] UnknownEventType),

    /// The registered handler failed; its error is kept as is.
    #[error("webhook handler failed: {0}")]
    Handler(#[source] HandlerError),
}

/// Routes verified deliveries to at most one handler per event type.
///
/// Deliveries of a known type with no registered handler are acknowledged
/// without doing anything.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<EventType, Handler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered = self.handlers.keys().map(|t| t.as_str()).collect::<Vec<_>>();
        registered.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("registered", &registered)
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`, replacing any previous one.
    pub fn on_event<F>(mut self, event_type: EventType, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &WebhookEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(event_type, Box::new(handler));
        self
    }

    pub fn on_request<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &SmsEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_sms(EventType::Request, handler)
    }

    pub fn on_delivered<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &SmsEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_sms(EventType::Delivered, handler)
    }

    pub fn on_dropped<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &SmsEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_sms(EventType::Dropped, handler)
    }

    pub fn on_sending<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &SmsEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_sms(EventType::Sending, handler)
    }

    pub fn on_mo<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &MoEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_event(EventType::Mo, move |envelope, event| match event.as_mo() {
            Some(mo) => handler(envelope, mo),
            None => Ok(()),
        })
    }

    pub fn on_template_accept<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &TemplateEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_template(EventType::TemplateAccept, handler)
    }

    pub fn on_template_reject<F>(self, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &TemplateEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_template(EventType::TemplateReject, handler)
    }

    fn on_sms<F>(self, event_type: EventType, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &SmsEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_event(event_type, move |envelope, event| match event.as_sms() {
            Some(sms) => handler(envelope, sms),
            None => Ok(()),
        })
    }

    fn on_template<F>(self, event_type: EventType, handler: F) -> Self
    where
        F: Fn(&WebhookEnvelope, &TemplateEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_event(event_type, move |envelope, event| match event.as_template() {
            Some(template) => handler(envelope, template),
            None => Ok(()),
        })
    }

    pub fn handles(&self, event_type: EventType) -> bool {
        self.handlers.contains_key(&event_type)
    }

    /// Decode and route one delivery. The envelope is assumed to be verified.
    pub fn dispatch(&self, envelope: &WebhookEnvelope) -> Result<(), DispatchError> {
        let event_type = envelope.event_type()?;
        let Some(handler) = self.handlers.get(&event_type) else {
            debug!(event = event_type.as_str(), "no handler registered; ignoring");
            return Ok(());
        };

        let event = WebhookEvent::decode(event_type, &envelope.data);
        handler(envelope, &event).map_err(DispatchError::Handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn envelope(event: &str, data: &[(&str, &str)]) -> WebhookEnvelope {
        let mut pairs = vec![("event", event)];
        pairs.extend_from_slice(data);
        WebhookEnvelope::from_pairs(pairs)
    }

    #[test]
    fn routes_to_the_registered_typed_handler() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let delivered = Arc::clone(&seen);
        let mo = Arc::clone(&seen);
        let dispatcher = Dispatcher::new()
            .on_delivered(move |_, sms| {
                delivered.lock().unwrap().push(format!("delivered:{}", sms.send_id));
                Ok(())
            })
            .on_mo(move |_, reply| {
                mo.lock().unwrap().push(format!("mo:{}", reply.content));
                Ok(())
            });

        dispatcher
            .dispatch(&envelope("delivered", &[("send_id", "x1")]))
            .unwrap();
        dispatcher
            .dispatch(&envelope("mo", &[("content", "TD")]))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["delivered:x1", "mo:TD"]);
    }

    #[test]
    fn known_type_without_handler_is_a_no_op() {
        let dispatcher = Dispatcher::new().on_delivered(|_, _| Err("must not run".into()));
        assert!(!dispatcher.handles(EventType::Dropped));
        assert!(dispatcher.dispatch(&envelope("dropped", &[])).is_ok());
    }

    #[test]
    fn unknown_type_is_an_error_and_runs_no_handler() {
        let called = Arc::new(Mutex::new(Vec::<EventType>::new()));
        let mut dispatcher = Dispatcher::new();
        for event_type in EventType::ALL {
            let called = Arc::clone(&called);
            dispatcher = dispatcher.on_event(event_type, move |_, _| {
                called.lock().unwrap().push(event_type);
                Ok(())
            });
        }
        assert!(EventType::ALL.into_iter().all(|t| dispatcher.handles(t)));

        for name in ["bogus_event", "unsubscribe", "Delivered", ""] {
            let err = dispatcher.dispatch(&envelope(name, &[])).unwrap_err();
            assert!(matches!(
                err,
                DispatchError::UnrecognizedEventType(UnknownEventType(ref got)) if got == name
            ));
        }
        assert!(called.lock().unwrap().is_empty());

        dispatcher.dispatch(&envelope("dropped", &[])).unwrap();
        assert_eq!(*called.lock().unwrap(), vec![EventType::Dropped]);
    }

    #[test]
    fn handler_errors_are_returned_unchanged() {
        let dispatcher =
            Dispatcher::new().on_template_reject(|_, template| Err(template.reason.clone().into()));
        let err = dispatcher
            .dispatch(&envelope("template_reject", &[("reason", "missing signature")]))
            .unwrap_err();
        match err {
            DispatchError::Handler(inner) => assert_eq!(inner.to_string(), "missing signature"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn only_one_handler_runs_per_delivery() {
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let dispatcher = Dispatcher::new()
            .on_sending(|_, _| Err("wrong handler".into()))
            .on_event(EventType::Request, move |_, event| {
                assert_eq!(event.event_type(), EventType::Request);
                *counter.lock().unwrap() += 1;
                Ok(())
            })
            .on_request(|_, _| Ok(()));

        dispatcher.dispatch(&envelope("request", &[])).unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);

        let dispatcher = Dispatcher::new().on_event(EventType::Request, {
            let counter = Arc::clone(&calls);
            move |_, _| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }
        });
        dispatcher.dispatch(&envelope("request", &[])).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn debug_lists_registered_types() {
        let dispatcher = Dispatcher::new()
            .on_template_accept(|_, _| Ok(()))
            .on_dropped(|_, _| Ok(()));
        assert_eq!(
            format!("{dispatcher:?}"),
            r#"Dispatcher { registered: ["dropped", "template_accept"] }"#
        );
    }
}
