use std::fmt;

use crate::domain::validation::ValidationError;

use phonenumber::country;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SUBMAIL application id (`appid`).
///
/// Invariant: non-empty after trimming.
pub struct AppId(String);

impl AppId {
    /// Form field name used by SUBMAIL (`appid`).
    pub const FIELD: &'static str = "appid";

    /// Create a validated [`AppId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// SUBMAIL application key, the shared secret behind every request signature.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
/// The `Debug` output never contains the key.
pub struct AppKey(String);

impl AppKey {
    /// Create a validated [`AppKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: "appkey" });
        }
        Ok(Self(value))
    }

    /// Borrow the key as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppKey(***)")
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Secret issued by SUBMAIL when a webhook (SUBHOOK) is registered.
///
/// Invariant: must not be empty. The `Debug` output never contains the key.
pub struct WebhookKey(String);

impl WebhookKey {
    /// Create a validated [`WebhookKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: "key" });
        }
        Ok(Self(value))
    }

    /// Borrow the key as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WebhookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS body (`content`).
///
/// Invariant: non-empty after trimming. The original value (including whitespace) is preserved.
pub struct MessageText(String);

impl MessageText {
    /// Form field name used by SUBMAIL (`content`).
    pub const FIELD: &'static str = "content";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Template project mark (`project`) used by the `xsend` family of endpoints.
///
/// Invariant: non-empty after trimming.
pub struct ProjectId(String);

impl ProjectId {
    /// Form field name used by SUBMAIL (`project`).
    pub const FIELD: &'static str = "project";

    /// Create a validated [`ProjectId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated project mark.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Template id (`template_id`) returned by template management.
///
/// Invariant: non-empty after trimming.
pub struct TemplateId(String);

impl TemplateId {
    /// Form field name used by SUBMAIL (`template_id`).
    pub const FIELD: &'static str = "template_id";

    /// Create a validated [`TemplateId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated template id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Caller-defined label (`tag`) echoed back in logs and webhooks.
///
/// Invariant: 1..=32 characters after trimming. Never part of the signature.
pub struct Tag(String);

impl Tag {
    /// Form field name used by SUBMAIL (`tag`).
    pub const FIELD: &'static str = "tag";

    /// Maximum length accepted by SUBMAIL.
    pub const MAX_CHARS: usize = 32;

    /// Create a validated [`Tag`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let chars = trimmed.chars().count();
        if chars > Self::MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: Self::FIELD,
                max: Self::MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS signature text (`sms_signature`), e.g. `【SUBMAIL】`.
///
/// Invariant: 1..=40 characters after trimming. Never part of the request signature.
pub struct SmsSignature(String);

impl SmsSignature {
    /// Form field name used by SUBMAIL (`sms_signature`).
    pub const FIELD: &'static str = "sms_signature";

    /// Maximum length accepted by SUBMAIL.
    pub const MAX_CHARS: usize = 40;

    /// Create a validated [`SmsSignature`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let chars = trimmed.chars().count();
        if chars > Self::MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: Self::FIELD,
                max: Self::MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated signature text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Unvalidated phone number as sent to SUBMAIL (`to`).
///
/// Invariant: non-empty after trimming. This type does not normalize; parse into
/// [`PhoneNumber`] first if you want normalization.
pub struct RawPhoneNumber(String);

impl RawPhoneNumber {
    /// Form field name used by SUBMAIL (`to`).
    pub const FIELD: &'static str = "to";

    /// Create a validated (non-empty) raw phone number.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Raw (trimmed) value as sent to SUBMAIL.
    pub fn raw(&self) -> &str {
        &self.0
    }
}

impl From<PhoneNumber> for RawPhoneNumber {
    /// Mainland China numbers are sent in national form, everything else as E.164.
    fn from(value: PhoneNumber) -> Self {
        if value.parsed.code().value() == PhoneNumber::CHINA_CALLING_CODE {
            Self(value.parsed.national().value().to_string())
        } else {
            Self(value.e164)
        }
    }
}

#[derive(Debug, Clone)]
/// Parsed phone number with an E.164 representation.
///
/// Equality, ordering, and hashing are based on the E.164 form.
pub struct PhoneNumber {
    raw: String,
    e164: String,
    parsed: phonenumber::PhoneNumber,
}

impl PhoneNumber {
    /// Form field name used by SUBMAIL (`to`).
    pub const FIELD: &'static str = "to";

    const CHINA_CALLING_CODE: u16 = 86;

    /// Parse and normalize a phone number into E.164.
    ///
    /// `default_region` is used when the input does not contain an explicit country prefix.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        let raw = input.trim().to_owned();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let parsed = phonenumber::parse(default_region, &raw)
            .map_err(|_| ValidationError::InvalidPhoneNumber { input: raw.clone() })?;

        let e164 = phonenumber::format(&parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();

        Ok(Self { raw, e164, parsed })
    }

    /// Parse a number, assuming mainland China when no country prefix is present.
    pub fn parse_cn(input: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(Some(country::Id::CN), input)
    }

    /// Raw input after trimming.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized E.164 representation.
    pub fn e164(&self) -> &str {
        &self.e164
    }

    /// The parsed phone number from the `phonenumber` crate.
    pub fn parsed(&self) -> &phonenumber::PhoneNumber {
        &self.parsed
    }
}

impl PartialEq for PhoneNumber {
    fn eq(&self, other: &Self) -> bool {
        self.e164 == other.e164
    }
}

impl Eq for PhoneNumber {}

impl std::hash::Hash for PhoneNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.e164.hash(state);
    }
}

impl std::cmp::PartialOrd for PhoneNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::cmp::Ord for PhoneNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.e164.cmp(&other.e164)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Delivery id (`send_id`) assigned by SUBMAIL to every accepted message.
pub struct SendId(String);

impl SendId {
    /// Field name used by SUBMAIL (`send_id`).
    pub const FIELD: &'static str = "send_id";

    /// Wrap an id as returned by SUBMAIL (no validation is performed).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Unix timestamp in seconds (`timestamp`).
pub struct UnixTimestamp(i64);

impl UnixTimestamp {
    /// Form field name used by SUBMAIL (`timestamp`).
    pub const FIELD: &'static str = "timestamp";

    /// Create a timestamp value (no range validation is performed).
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current local wall-clock time.
    ///
    /// A clock set before the Unix epoch yields `0`; SUBMAIL rejects it with a
    /// timestamp error, which the client then recovers from by resyncing.
    pub fn now() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    /// Get the underlying timestamp in seconds.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
