//! Client layer: signs requests, talks to SUBMAIL and maps transport ↔ domain.

mod resync;

#[cfg(test)]
mod fake;

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;
use url::Url;

use crate::domain::{
    BalanceResponse, BatchSend, BatchSendResponse, BatchSendTemplate, Classification, ErrorCode,
    LogEntry, LogQuery, MoEntry, MoQuery, MultiSend, MultiSendResult, MultiSendTemplate, Page,
    ReportsQuery, ReportsResponse, SendResponse, SendSms, SendTemplate, ServiceStatus,
    TemplateCreated, TemplateDraft, TemplateId, TemplateRequest, TemplatesResponse,
    UnixTimestamp, ValidationError,
};
use crate::signing::{
    AuthMode, Credential, ParameterSet, SignAlgorithm, SignaturePreview, Signer,
    UnsupportedAlgorithm,
};
use crate::transport::{self, ErrorEnvelope, Method, TransportError};

/// Production endpoint of the SUBMAIL v4 API.
pub const DEFAULT_BASE_URL: &str = "https://api-v4.mysubmail.com";

const SEND_PATH: &str = "/sms/send.json";
const XSEND_PATH: &str = "/sms/xsend.json";
const MULTISEND_PATH: &str = "/sms/multisend.json";
const MULTIXSEND_PATH: &str = "/sms/multixsend.json";
const BATCHSEND_PATH: &str = "/sms/batchsend.json";
const BATCHXSEND_PATH: &str = "/sms/batchxsend.json";
const TEMPLATE_PATH: &str = "/sms/template.json";
const REPORTS_PATH: &str = "/sms/reports.json";
const LOG_PATH: &str = "/sms/log.json";
const MO_PATH: &str = "/sms/mo.json";
const BALANCE_PATH: &str = "/balance/sms.json";
const TIMESTAMP_PATH: &str = "/service/timestamp.json";
const STATUS_PATH: &str = "/service/status.json";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn request<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn request<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let request = match method {
                Method::Get => self.client.get(url).query(&params),
                Method::Post => self.client.post(url).form(&params),
                Method::Put => self.client.put(url).form(&params),
                Method::Delete => self.client.delete(url).form(&params),
            };
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API error {}: {}", .code.as_i32(), api_error_detail(.message, .description))]
/// Error reported by SUBMAIL in a `{"status":"error"}` response.
pub struct ApiError {
    pub code: ErrorCode,
    /// `msg` as sent by SUBMAIL, if any.
    pub message: Option<String>,
    /// Description of `code` from the built-in error table.
    pub description: &'static str,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: Option<String>) -> Self {
        Self {
            code,
            message,
            description: code.classify().description,
        }
    }

    pub fn classification(&self) -> Classification {
        self.code.classify()
    }

    /// Whether the error qualifies for the one-shot clock resync.
    pub fn is_timestamp_related(&self) -> bool {
        self.code.is_timestamp_related()
    }
}

/// Vendor `msg` followed by the table description, or the description alone.
fn api_error_detail(message: &Option<String>, description: &str) -> String {
    match message.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => format!("{message} ({description})"),
        _ => description.to_owned(),
    }
}

impl From<ErrorEnvelope> for ApiError {
    fn from(value: ErrorEnvelope) -> Self {
        Self::new(value.code, value.msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Invalid client configuration.
pub enum ConfigError {
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`SubmailClient`].
///
/// This error preserves:
/// - HTTP-level failures (non-2xx status or transport failures),
/// - API-level failures (`status == "error"`), with the vendor code classified,
/// - resync failures, keeping the error that triggered the resync,
/// - configuration, validation and parse failures.
pub enum SubmailError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Non-successful HTTP status code returned by the server.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// SUBMAIL answered with an error envelope.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A timestamp error triggered a resync, but the server time could not be fetched.
    #[error("clock resync after {original} failed: {source}")]
    ClockSync {
        original: ApiError,
        #[source]
        source: Box<SubmailError>,
    },

    /// Response body could not be parsed as the expected format.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl SubmailError {
    /// The vendor error carried by this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::ClockSync { original, .. } => Some(original),
            _ => None,
        }
    }
}

impl From<TransportError> for SubmailError {
    fn from(value: TransportError) -> Self {
        Self::Parse(Box::new(value))
    }
}

#[derive(Debug, Clone)]
/// Builder for [`SubmailClient`].
///
/// Use this when you need to customize the base URL, auth mode, timeout, or user-agent.
pub struct SubmailClientBuilder {
    credential: Credential,
    base_url: String,
    auth_mode: AuthMode,
    sign_type: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl SubmailClientBuilder {
    /// Create a builder with the production base URL and MD5 digest signing.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_mode: AuthMode::default(),
            sign_type: None,
            timeout: None,
            user_agent: None,
        }
    }

    /// Override the API base URL (scheme and host, optionally a path prefix).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self.sign_type = None;
        self
    }

    /// Select digest signing by its `sign_type` name (`md5` / `sha1`).
    ///
    /// An empty value selects MD5; anything else unknown fails in [`Self::build`].
    pub fn sign_type(mut self, sign_type: impl Into<String>) -> Self {
        self.sign_type = Some(sign_type.into());
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build a [`SubmailClient`].
    pub fn build(self) -> Result<SubmailClient, SubmailError> {
        let base_url = normalize_base_url(&self.base_url)?;
        let auth_mode = match self.sign_type.as_deref() {
            Some(sign_type) => AuthMode::Digest(
                SignAlgorithm::from_sign_type(sign_type).map_err(ConfigError::from)?,
            ),
            None => self.auth_mode,
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| SubmailError::Transport(Box::new(err)))?;

        Ok(SubmailClient {
            credential: Arc::new(self.credential),
            base_url,
            auth_mode: Arc::new(RwLock::new(auth_mode)),
            clock: UnixTimestamp::now,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };
    let parsed = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_owned()));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_owned())
}

#[derive(Clone)]
/// High-level SUBMAIL SMS client.
///
/// Every signed call goes through a one-shot clock resync: when SUBMAIL rejects
/// the request timestamp (codes 151/152), the client fetches the server time,
/// re-signs the same parameters with it, and retries once.
///
/// The auth mode can be swapped at runtime with [`SubmailClient::set_auth_mode`];
/// requests already in flight keep the mode they started with.
pub struct SubmailClient {
    credential: Arc<Credential>,
    base_url: String,
    auth_mode: Arc<RwLock<AuthMode>>,
    clock: fn() -> UnixTimestamp,
    http: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for SubmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmailClient")
            .field("app_id", self.credential.app_id())
            .field("base_url", &self.base_url)
            .field("auth_mode", &self.auth_mode())
            .finish_non_exhaustive()
    }
}

impl SubmailClient {
    /// Create a client using the production base URL and MD5 digest signing.
    ///
    /// For more customization, use [`SubmailClient::builder`].
    pub fn new(credential: Credential) -> Self {
        Self {
            credential: Arc::new(credential),
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_mode: Arc::new(RwLock::new(AuthMode::default())),
            clock: UnixTimestamp::now,
            http: Arc::new(ReqwestTransport {
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Start building a client with custom settings.
    pub fn builder(credential: Credential) -> SubmailClientBuilder {
        SubmailClientBuilder::new(credential)
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Current auth mode (a snapshot).
    pub fn auth_mode(&self) -> AuthMode {
        *self.auth_mode.read()
    }

    /// Switch the auth mode for subsequent requests. Shared by all clones.
    pub fn set_auth_mode(&self, mode: AuthMode) {
        *self.auth_mode.write() = mode;
    }

    /// Switch to digest signing by `sign_type` name; empty selects MD5.
    pub fn set_sign_type(&self, sign_type: &str) -> Result<(), ConfigError> {
        let algorithm = SignAlgorithm::from_sign_type(sign_type)?;
        self.set_auth_mode(AuthMode::Digest(algorithm));
        Ok(())
    }

    /// Canonical string and signature the client would send for `params`.
    pub fn preview_signature(
        &self,
        params: &ParameterSet,
        timestamp: UnixTimestamp,
    ) -> SignaturePreview {
        Signer::new(&self.credential, self.auth_mode()).preview(params, timestamp)
    }

    /// Send one message with literal content (`sms/send`).
    ///
    /// Errors:
    /// - [`SubmailError::HttpStatus`] for non-2xx HTTP responses,
    /// - [`SubmailError::Api`] when SUBMAIL returns an error envelope,
    /// - [`SubmailError::ClockSync`] when a timestamp error could not be recovered from.
    pub async fn send_sms(&self, request: SendSms) -> Result<SendResponse, SubmailError> {
        let params = transport::encode_send_form(&request);
        let body = self.execute(Method::Post, SEND_PATH, params).await?;
        Ok(transport::decode_send_json_response(&body)?)
    }

    /// Send one message rendered from a template (`sms/xsend`).
    pub async fn send_template(&self, request: SendTemplate) -> Result<SendResponse, SubmailError> {
        let params = transport::encode_send_template_form(&request)?;
        let body = self.execute(Method::Post, XSEND_PATH, params).await?;
        Ok(transport::decode_send_json_response(&body)?)
    }

    /// Send shared content to up to 200 recipients (`sms/multisend`).
    ///
    /// Per-recipient failures are reported in the result list, not as an error.
    pub async fn multi_send(
        &self,
        request: MultiSend,
    ) -> Result<Vec<MultiSendResult>, SubmailError> {
        let params = transport::encode_multi_send_form(&request)?;
        let body = self.execute(Method::Post, MULTISEND_PATH, params).await?;
        Ok(transport::decode_multi_send_json_response(&body)?)
    }

    /// Send one template to up to 200 recipients (`sms/multixsend`).
    pub async fn multi_send_template(
        &self,
        request: MultiSendTemplate,
    ) -> Result<Vec<MultiSendResult>, SubmailError> {
        let params = transport::encode_multi_send_template_form(&request)?;
        let body = self.execute(Method::Post, MULTIXSEND_PATH, params).await?;
        Ok(transport::decode_multi_send_json_response(&body)?)
    }

    /// Send the same content to a recipient list (`sms/batchsend`).
    pub async fn batch_send(&self, request: BatchSend) -> Result<BatchSendResponse, SubmailError> {
        let params = transport::encode_batch_send_form(&request)?;
        let body = self.execute(Method::Post, BATCHSEND_PATH, params).await?;
        Ok(transport::decode_batch_send_json_response(&body)?)
    }

    /// Send one template with shared variables to a recipient list (`sms/batchxsend`).
    pub async fn batch_send_template(
        &self,
        request: BatchSendTemplate,
    ) -> Result<BatchSendResponse, SubmailError> {
        let params = transport::encode_batch_send_template_form(&request)?;
        let body = self.execute(Method::Post, BATCHXSEND_PATH, params).await?;
        Ok(transport::decode_batch_send_json_response(&body)?)
    }

    /// List templates, or fetch the one with `template_id`.
    pub async fn get_templates(
        &self,
        template_id: Option<TemplateId>,
    ) -> Result<TemplatesResponse, SubmailError> {
        let body = self.template(TemplateRequest::Get(template_id)).await?;
        Ok(transport::decode_templates_json_response(&body)?)
    }

    pub async fn create_template(
        &self,
        draft: TemplateDraft,
    ) -> Result<TemplateCreated, SubmailError> {
        let body = self.template(TemplateRequest::Create(draft)).await?;
        Ok(transport::decode_template_created_json_response(&body)?)
    }

    pub async fn update_template(
        &self,
        template_id: TemplateId,
        draft: TemplateDraft,
    ) -> Result<(), SubmailError> {
        self.template(TemplateRequest::Update(template_id, draft))
            .await
            .map(drop)
    }

    pub async fn delete_template(&self, template_id: TemplateId) -> Result<(), SubmailError> {
        self.template(TemplateRequest::Delete(template_id))
            .await
            .map(drop)
    }

    /// Remaining SMS credits (`balance/sms`).
    pub async fn balance(&self) -> Result<BalanceResponse, SubmailError> {
        let body = self
            .execute(Method::Post, BALANCE_PATH, ParameterSet::new())
            .await?;
        Ok(transport::decode_balance_json_response(&body)?)
    }

    /// Delivery statistics for a project and date window (`sms/reports`).
    pub async fn reports(&self, query: ReportsQuery) -> Result<ReportsResponse, SubmailError> {
        let params = transport::encode_reports_form(&query);
        let body = self.execute(Method::Post, REPORTS_PATH, params).await?;
        Ok(transport::decode_reports_json_response(&body)?)
    }

    /// Per-message history (`sms/log`).
    pub async fn log(&self, query: LogQuery) -> Result<Page<LogEntry>, SubmailError> {
        let params = transport::encode_log_form(&query);
        let body = self.execute(Method::Post, LOG_PATH, params).await?;
        Ok(transport::decode_log_json_response(&body)?)
    }

    /// Inbound replies (`sms/mo`).
    pub async fn mo(&self, query: MoQuery) -> Result<Page<MoEntry>, SubmailError> {
        let params = transport::encode_mo_form(&query);
        let body = self.execute(Method::Post, MO_PATH, params).await?;
        Ok(transport::decode_mo_json_response(&body)?)
    }

    /// Seconds the local clock is ahead of SUBMAIL (negative when behind).
    pub async fn time_offset(&self) -> Result<i64, SubmailError> {
        let server = self.server_timestamp().await?;
        Ok((self.clock)().value() - server.value())
    }

    /// Server clock (`service/timestamp`). Unauthenticated.
    pub async fn server_timestamp(&self) -> Result<UnixTimestamp, SubmailError> {
        let body = self
            .send_once(Method::Get, TIMESTAMP_PATH, ParameterSet::new())
            .await?;
        Ok(transport::decode_server_timestamp_json_response(&body)?)
    }

    /// Service health (`service/status`). Unauthenticated.
    pub async fn service_status(&self) -> Result<ServiceStatus, SubmailError> {
        let body = self
            .send_once(Method::Get, STATUS_PATH, ParameterSet::new())
            .await?;
        Ok(transport::decode_service_status_json_response(&body)?)
    }

    async fn template(&self, request: TemplateRequest) -> Result<String, SubmailError> {
        let (method, params) = transport::encode_template_request(&request);
        self.execute(method, TEMPLATE_PATH, params).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// One HTTP round trip; returns the body of a non-error response.
    async fn send_once(
        &self,
        method: Method,
        path: &'static str,
        params: ParameterSet,
    ) -> Result<String, SubmailError> {
        let url = self.url(path);
        debug!(
            method = method.as_str(),
            endpoint = path,
            fields = params.len(),
            "sending SUBMAIL request"
        );

        let response = self
            .http
            .request(method, &url, params.into_pairs())
            .await
            .map_err(SubmailError::Transport)?;

        if !(200..=299).contains(&response.status) {
            let body = if response.body.trim().is_empty() {
                None
            } else {
                Some(response.body)
            };
            return Err(SubmailError::HttpStatus {
                status: response.status,
                body,
            });
        }

        if let Some(envelope) = transport::decode_error_envelope(&response.body)? {
            let err = ApiError::from(envelope);
            debug!(endpoint = path, code = err.code.as_i32(), "SUBMAIL returned an error");
            return Err(err.into());
        }

        Ok(response.body)
    }
}
