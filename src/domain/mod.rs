//! Domain layer: strong types with validation and invariants (no I/O).

mod error_code;
mod request;
mod response;
mod validation;
mod value;

pub use error_code::{
    Classification, ErrorCategory, ErrorCode, KnownErrorCode, RetryClass, classify,
};
pub use request::{
    BATCH_SEND_MAX_RECIPIENTS, BatchSend, BatchSendTemplate, DateRange, DeliveryState, LogQuery,
    MULTI_SEND_MAX_RECIPIENTS, MoQuery, MultiRecipient, MultiSend, MultiSendTemplate,
    ReportsQuery, SendSms, SendTemplate, TEMPLATE_TITLE_MAX_CHARS, TemplateDraft,
    TemplateRequest, TemplateVars,
};
pub use response::{
    BalanceResponse, BatchSendResponse, LogEntry, MoEntry, MultiSendResult, Page,
    ReportOverview, ReportsResponse, SendResponse, ServiceStatus, Status, Template,
    TemplateCreated, TemplatesResponse,
};
pub use validation::ValidationError;
pub use value::{
    AppId, AppKey, MessageText, PhoneNumber, ProjectId, RawPhoneNumber, SendId, SmsSignature,
    Tag, TemplateId, UnixTimestamp, WebhookKey,
};
