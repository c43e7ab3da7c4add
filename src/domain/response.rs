use crate::domain::error_code::ErrorCode;
use crate::domain::value::{SendId, TemplateId, UnixTimestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub send_id: SendId,
    pub fee: u32,
    pub sms_credits: Option<String>,
    pub transactional_sms_credits: Option<String>,
}

/// Per-recipient outcome of `multisend` / `multixsend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSendResult {
    pub to: String,
    pub status: Status,
    pub send_id: Option<SendId>,
    pub fee: u32,
    pub code: Option<ErrorCode>,
    pub msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceResponse {
    pub balance: Option<String>,
    pub transactional_balance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub template_id: TemplateId,
    pub sms_title: Option<String>,
    pub sms_signature: Option<String>,
    pub sms_content: Option<String>,
    pub add_date: Option<UnixTimestamp>,
    pub edit_date: Option<UnixTimestamp>,
    pub template_status: Option<String>,
    pub template_status_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCreated {
    pub template_id: TemplateId,
}

/// Outcome of `batchsend` / `batchxsend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSendResponse {
    /// Batch id assigned by SUBMAIL, when reported.
    pub batch_list: Option<String>,
    pub total_fee: u32,
    pub responses: Vec<MultiSendResult>,
}

/// Totals section of `sms/reports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOverview {
    pub request: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub sending: u64,
    pub fee: u64,
}

impl ReportOverview {
    /// Delivered share of all requests, in percent. Zero when nothing was sent.
    pub fn success_rate(&self) -> f64 {
        percentage(self.delivered, self.request)
    }

    /// Dropped share of all requests, in percent.
    pub fn failure_rate(&self) -> f64 {
        percentage(self.dropped, self.request)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportsResponse {
    pub start_date: Option<UnixTimestamp>,
    pub end_date: Option<UnixTimestamp>,
    pub overview: ReportOverview,
}

/// One row of `sms/log`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub send_id: Option<SendId>,
    pub to: Option<String>,
    pub content: Option<String>,
    pub fee: u32,
    pub send_at: Option<UnixTimestamp>,
    pub report_at: Option<UnixTimestamp>,
    pub report_state: Option<String>,
    pub dropped_reason: Option<String>,
}

/// One row of `sms/mo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoEntry {
    pub from: Option<String>,
    pub content: Option<String>,
    pub sms_content: Option<String>,
    pub reply_at: Option<UnixTimestamp>,
}

/// A page of `sms/log` or `sms/mo` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Matching rows on the server, across all pages.
    pub total: u64,
    pub offset: u64,
    pub rows: Vec<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub status: String,
    pub runtime: f64,
}

impl ServiceStatus {
    /// SUBMAIL reports a healthy service as `runing` (sic).
    pub fn is_running(&self) -> bool {
        matches!(self.status.as_str(), "runing" | "running")
    }
}
