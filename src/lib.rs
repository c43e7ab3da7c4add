//! Typed Rust client for the SUBMAIL SMS HTTP API.
//!
//! The crate is split into a domain layer of strong types, a signing layer
//! (canonical parameter strings, MD5/SHA-1 digests), a transport layer for
//! wire-format quirks, a small client layer orchestrating requests with a
//! one-shot clock resync, and a webhook layer verifying and dispatching
//! inbound SUBHOOK deliveries.
//!
//! ```rust,no_run
//! use submail::{Credential, MessageText, RawPhoneNumber, SendSms, SubmailClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), submail::SubmailError> {
//!     let client = SubmailClient::new(Credential::new("112455", "...")?);
//!     let to = RawPhoneNumber::new("13800138000")?;
//!     let content = MessageText::new("【SUBMAIL】your code is 1234")?;
//!     let response = client.send_sms(SendSms::new(to, content)).await?;
//!     println!("accepted as {}", response.send_id.as_str());
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod signing;
mod transport;
pub mod webhook;

pub use client::{ApiError, ConfigError, SubmailClient, SubmailClientBuilder, SubmailError};
pub use domain::{
    AppId, AppKey, BalanceResponse, BatchSend, BatchSendResponse, BatchSendTemplate, DateRange,
    DeliveryState, ErrorCategory, ErrorCode, KnownErrorCode, LogEntry, LogQuery, MessageText,
    MoEntry, MoQuery, MultiRecipient, MultiSend, MultiSendResult, MultiSendTemplate, Page,
    PhoneNumber, ProjectId, RawPhoneNumber, ReportOverview, ReportsQuery, ReportsResponse,
    RetryClass, SendId, SendResponse, SendSms, SendTemplate, ServiceStatus, SmsSignature, Status,
    Tag, Template, TemplateCreated, TemplateDraft, TemplateId, TemplatesResponse, UnixTimestamp,
    ValidationError, WebhookKey, classify,
};
pub use signing::{AuthMode, Credential, SignAlgorithm};
pub use webhook::{
    Dispatcher, EventType, WebhookEndpoint, WebhookEnvelope, WebhookEvent, verify_signature,
};
