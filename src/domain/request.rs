use std::collections::BTreeMap;

use crate::domain::validation::ValidationError;
use crate::domain::value::{
    MessageText, ProjectId, RawPhoneNumber, SendId, SmsSignature, Tag, TemplateId, UnixTimestamp,
};

pub const MULTI_SEND_MAX_RECIPIENTS: usize = 200;
pub const BATCH_SEND_MAX_RECIPIENTS: usize = 10_000;
pub const TEMPLATE_TITLE_MAX_CHARS: usize = 64;

/// Template variables (`vars`), serialized as a JSON object on the wire.
pub type TemplateVars = BTreeMap<String, String>;

#[derive(Debug, Clone)]
/// `sms/send`: one message with literal content to one recipient.
pub struct SendSms {
    to: RawPhoneNumber,
    content: MessageText,
    tag: Option<Tag>,
}

impl SendSms {
    pub fn new(to: RawPhoneNumber, content: MessageText) -> Self {
        Self {
            to,
            content,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn to(&self) -> &RawPhoneNumber {
        &self.to
    }

    pub fn content(&self) -> &MessageText {
        &self.content
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

#[derive(Debug, Clone)]
/// `sms/xsend`: one message rendered from a stored template.
pub struct SendTemplate {
    to: RawPhoneNumber,
    project: ProjectId,
    vars: TemplateVars,
    tag: Option<Tag>,
    sms_signature: Option<SmsSignature>,
}

impl SendTemplate {
    pub fn new(to: RawPhoneNumber, project: ProjectId) -> Self {
        Self {
            to,
            project,
            vars: TemplateVars::new(),
            tag: None,
            sms_signature: None,
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: TemplateVars) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Override the signature stored with the template.
    pub fn with_sms_signature(mut self, signature: SmsSignature) -> Self {
        self.sms_signature = Some(signature);
        self
    }

    pub fn to(&self) -> &RawPhoneNumber {
        &self.to
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    pub fn sms_signature(&self) -> Option<&SmsSignature> {
        self.sms_signature.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One entry of the `multi` array.
pub struct MultiRecipient {
    pub to: RawPhoneNumber,
    pub vars: TemplateVars,
}

impl MultiRecipient {
    pub fn new(to: RawPhoneNumber) -> Self {
        Self {
            to,
            vars: TemplateVars::new(),
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
/// `sms/multisend`: shared content with per-recipient variables.
pub struct MultiSend {
    content: MessageText,
    multi: Vec<MultiRecipient>,
    tag: Option<Tag>,
}

impl MultiSend {
    pub fn new(content: MessageText, multi: Vec<MultiRecipient>) -> Result<Self, ValidationError> {
        check_recipients("multi", MULTI_SEND_MAX_RECIPIENTS, multi.len())?;
        Ok(Self {
            content,
            multi,
            tag: None,
        })
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn content(&self) -> &MessageText {
        &self.content
    }

    pub fn multi(&self) -> &[MultiRecipient] {
        &self.multi
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

#[derive(Debug, Clone)]
/// `sms/multixsend`: one template with per-recipient variables.
pub struct MultiSendTemplate {
    project: ProjectId,
    multi: Vec<MultiRecipient>,
    tag: Option<Tag>,
}

impl MultiSendTemplate {
    pub fn new(project: ProjectId, multi: Vec<MultiRecipient>) -> Result<Self, ValidationError> {
        check_recipients("multi", MULTI_SEND_MAX_RECIPIENTS, multi.len())?;
        Ok(Self {
            project,
            multi,
            tag: None,
        })
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn multi(&self) -> &[MultiRecipient] {
        &self.multi
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

#[derive(Debug, Clone)]
/// `sms/batchsend`: the same literal content to a list of recipients.
pub struct BatchSend {
    to: Vec<RawPhoneNumber>,
    content: MessageText,
    tag: Option<Tag>,
}

impl BatchSend {
    pub fn new(to: Vec<RawPhoneNumber>, content: MessageText) -> Result<Self, ValidationError> {
        check_recipients(RawPhoneNumber::FIELD, BATCH_SEND_MAX_RECIPIENTS, to.len())?;
        Ok(Self {
            to,
            content,
            tag: None,
        })
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn to(&self) -> &[RawPhoneNumber] {
        &self.to
    }

    pub fn content(&self) -> &MessageText {
        &self.content
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

#[derive(Debug, Clone)]
/// `sms/batchxsend`: one template with shared variables to a list of recipients.
pub struct BatchSendTemplate {
    to: Vec<RawPhoneNumber>,
    project: ProjectId,
    vars: TemplateVars,
    tag: Option<Tag>,
}

impl BatchSendTemplate {
    pub fn new(to: Vec<RawPhoneNumber>, project: ProjectId) -> Result<Self, ValidationError> {
        check_recipients(RawPhoneNumber::FIELD, BATCH_SEND_MAX_RECIPIENTS, to.len())?;
        Ok(Self {
            to,
            project,
            vars: TemplateVars::new(),
            tag: None,
        })
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn to(&self) -> &[RawPhoneNumber] {
        &self.to
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

fn check_recipients(field: &'static str, max: usize, actual: usize) -> Result<(), ValidationError> {
    if actual == 0 {
        return Err(ValidationError::Empty { field });
    }
    if actual > max {
        return Err(ValidationError::TooManyRecipients { max, actual });
    }
    Ok(())
}

#[derive(Debug, Clone)]
/// Content of a template to create or update through `sms/template`.
pub struct TemplateDraft {
    title: Option<String>,
    sms_signature: SmsSignature,
    content: MessageText,
}

impl TemplateDraft {
    pub fn new(sms_signature: SmsSignature, content: MessageText) -> Self {
        Self {
            title: None,
            sms_signature,
            content,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        let chars = title.chars().count();
        if chars > TEMPLATE_TITLE_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "sms_title",
                max: TEMPLATE_TITLE_MAX_CHARS,
                actual: chars,
            });
        }
        self.title = Some(title);
        Ok(self)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn sms_signature(&self) -> &SmsSignature {
        &self.sms_signature
    }

    pub fn content(&self) -> &MessageText {
        &self.content
    }
}

#[derive(Debug, Clone)]
/// `sms/template` operations.
pub enum TemplateRequest {
    /// List all templates, or fetch one by id.
    Get(Option<TemplateId>),
    Create(TemplateDraft),
    Update(TemplateId, TemplateDraft),
    Delete(TemplateId),
}

/// Delivery state filter of `sms/log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Delivered,
    Dropped,
}

impl DeliveryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Dropped => "dropped",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Date window shared by the analytics queries. Bounds are inclusive UNIX seconds.
pub struct DateRange {
    pub start_date: Option<UnixTimestamp>,
    pub end_date: Option<UnixTimestamp>,
}

impl DateRange {
    pub fn between(start_date: UnixTimestamp, end_date: UnixTimestamp) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// `sms/reports`: aggregated delivery statistics.
pub struct ReportsQuery {
    pub project: Option<ProjectId>,
    pub range: DateRange,
}

#[derive(Debug, Clone, Default)]
/// `sms/log`: per-message history. Every filter is optional.
pub struct LogQuery {
    pub project: Option<ProjectId>,
    pub to: Option<RawPhoneNumber>,
    pub send_id: Option<SendId>,
    pub status: Option<DeliveryState>,
    pub range: DateRange,
    pub offset: Option<u32>,
    pub rows: Option<u32>,
}

#[derive(Debug, Clone, Default)]
/// `sms/mo`: inbound (mobile originated) replies.
pub struct MoQuery {
    pub from: Option<RawPhoneNumber>,
    pub range: DateRange,
    pub offset: Option<u32>,
    pub rows: Option<u32>,
}
