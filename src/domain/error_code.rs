//! SUBMAIL error codes and their classification.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// SUBMAIL error code (`code` in an error response).
///
/// This value is preserved as-is even when the code is unknown to this crate.
pub struct ErrorCode(i32);

impl ErrorCode {
    /// Construct an error code from its integer representation.
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    /// Get the integer code as provided by SUBMAIL.
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Map this code to a known variant, if one exists.
    pub fn known(self) -> Option<KnownErrorCode> {
        KnownErrorCode::from_code(self.0)
    }

    /// Look up description, category and retry class. Never fails.
    pub fn classify(self) -> Classification {
        classify(self.0)
    }

    /// Returns `true` if the code is eligible for the one-shot clock resync retry.
    pub fn is_timestamp_related(self) -> bool {
        self.classify().retry_class == RetryClass::TimestampRelated
    }

    /// Returns `true` if this code rejects the credentials or the signature.
    pub fn is_auth_error(self) -> bool {
        matches!(self.known(), Some(kind) if kind.is_auth_error())
    }
}

/// Coarse grouping of the vendor error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// App, developer account, credentials and signature checks (101-127).
    Application,
    /// Request timestamp rejected (151-152).
    Timestamp,
    /// No usable SMS signature configured for the app (154).
    SignatureAvailability,
    /// Address book selection (201-203, 501).
    AddressBook,
    /// Recipient addressing (251-253).
    Recipient,
    /// Project / template marks and JSON parameters (305-310).
    Project,
    /// Message body, signature and template content (401-422).
    Content,
    /// Daily quota, credits and balance (901-905).
    Quota,
    /// Not in the vendor table.
    Unknown,
}

/// Whether a failed request may be retried after resyncing the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryClass {
    TimestampRelated,
    NotRetryable,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub description: &'static str,
    pub category: ErrorCategory,
    pub retry_class: RetryClass,
}

const UNKNOWN_DESCRIPTION: &str = "unknown error";

/// Classify a raw vendor error code.
pub fn classify(code: i32) -> Classification {
    match KnownErrorCode::from_code(code) {
        Some(kind) => Classification {
            description: kind.description(),
            category: kind.category(),
            retry_class: kind.retry_class(),
        },
        None => Classification {
            description: UNKNOWN_DESCRIPTION,
            category: ErrorCategory::Unknown,
            retry_class: RetryClass::NotRetryable,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Error codes documented by SUBMAIL.
///
/// Unknown codes are preserved as [`ErrorCode`] and return `None` from [`KnownErrorCode::from_code`].
pub enum KnownErrorCode {
    IncorrectAppId,
    AppDisabled,
    DeveloperNotEnabled,
    DeveloperNotVerified,
    AccountExpired,
    AccountDisabled,
    InvalidSignTypeValue,
    InvalidSignature,
    InvalidAppKey,
    WrongSignType,
    EmptySignature,
    SubscriptionDisabled,
    IpNotWhitelisted,
    PhoneBlacklisted,
    PhoneRequestLimit,
    SmsSignatureTakenByOtherApp,
    TemplateSignatureMismatch,
    TemplateInvalid,
    PermissionDenied,
    TemplateExpired,
    SmsSignatureNotFiled,
    SmsSignatureAlreadyExists,
    InvalidTimestamp,
    TimestampOutOfWindow,
    NoAvailableSmsSignature,
    UnknownAddressBookMode,
    IncorrectRecipientAddress,
    EmptyAddressBook,
    IncorrectMessageRecipient,
    EmptyMessageAddressBook,
    ContactUnsubscribed,
    MissingProject,
    InvalidProject,
    MalformedJson,
    TagTooLong,
    EmptySmsSignature,
    SmsSignatureTooLong,
    EmptyContent,
    ContentTooLong,
    ForbiddenWords,
    EmptyProjectForContent,
    InvalidProjectForContent,
    DuplicateMessage,
    ProjectUnderReview,
    InvalidMulti,
    TemplateMissingSignature,
    TemplateSignatureTooLong,
    TemplateSignatureLength,
    TemplateEmptyContent,
    TemplateContentTooLong,
    TemplateTitleTooLong,
    TemplateIdMissing,
    TemplateNotFound,
    TemplateUpdateEmptyContent,
    NoMatchingTemplate,
    TemplateTooLong,
    InvalidAddressBookSign,
    DailyQuotaExhausted,
    InsufficientCredits,
    InsufficientBalance,
    InsufficientTransactionalBalance,
}

impl KnownErrorCode {
    /// Convert a raw SUBMAIL integer code into a known variant.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            101 => Self::IncorrectAppId,
            102 => Self::AppDisabled,
            103 => Self::DeveloperNotEnabled,
            104 => Self::DeveloperNotVerified,
            105 => Self::AccountExpired,
            106 => Self::AccountDisabled,
            107 => Self::InvalidSignTypeValue,
            108 => Self::InvalidSignature,
            109 => Self::InvalidAppKey,
            110 => Self::WrongSignType,
            111 => Self::EmptySignature,
            112 => Self::SubscriptionDisabled,
            113 => Self::IpNotWhitelisted,
            114 => Self::PhoneBlacklisted,
            115 => Self::PhoneRequestLimit,
            116 => Self::SmsSignatureTakenByOtherApp,
            117 => Self::TemplateSignatureMismatch,
            118 => Self::TemplateInvalid,
            119 => Self::PermissionDenied,
            120 => Self::TemplateExpired,
            126 => Self::SmsSignatureNotFiled,
            127 => Self::SmsSignatureAlreadyExists,
            151 => Self::InvalidTimestamp,
            152 => Self::TimestampOutOfWindow,
            154 => Self::NoAvailableSmsSignature,
            201 => Self::UnknownAddressBookMode,
            202 => Self::IncorrectRecipientAddress,
            203 => Self::EmptyAddressBook,
            251 => Self::IncorrectMessageRecipient,
            252 => Self::EmptyMessageAddressBook,
            253 => Self::ContactUnsubscribed,
            305 => Self::MissingProject,
            306 => Self::InvalidProject,
            307 => Self::MalformedJson,
            310 => Self::TagTooLong,
            401 => Self::EmptySmsSignature,
            402 => Self::SmsSignatureTooLong,
            403 => Self::EmptyContent,
            404 => Self::ContentTooLong,
            405 => Self::ForbiddenWords,
            406 => Self::EmptyProjectForContent,
            407 => Self::InvalidProjectForContent,
            408 => Self::DuplicateMessage,
            409 => Self::ProjectUnderReview,
            410 => Self::InvalidMulti,
            411 => Self::TemplateMissingSignature,
            412 => Self::TemplateSignatureTooLong,
            413 => Self::TemplateSignatureLength,
            414 => Self::TemplateEmptyContent,
            415 => Self::TemplateContentTooLong,
            416 => Self::TemplateTitleTooLong,
            417 => Self::TemplateIdMissing,
            418 => Self::TemplateNotFound,
            419 => Self::TemplateUpdateEmptyContent,
            420 => Self::NoMatchingTemplate,
            422 => Self::TemplateTooLong,
            501 => Self::InvalidAddressBookSign,
            901 => Self::DailyQuotaExhausted,
            903 => Self::InsufficientCredits,
            904 => Self::InsufficientBalance,
            905 => Self::InsufficientTransactionalBalance,
            _ => return None,
        })
    }

    /// Human-readable description from the vendor error table.
    pub fn description(self) -> &'static str {
        match self {
            Self::IncorrectAppId => "incorrect APP ID",
            Self::AppDisabled => "this app has been disabled",
            Self::DeveloperNotEnabled => "developer identity of this app is not verified",
            Self::DeveloperNotVerified => "developer profile failed verification or has changed",
            Self::AccountExpired => "this account has expired",
            Self::AccountDisabled => "this account has been disabled",
            Self::InvalidSignTypeValue => "sign_type must be MD5, SHA1 or normal",
            Self::InvalidSignature => "invalid signature parameter",
            Self::InvalidAppKey => "invalid appkey",
            Self::WrongSignType => "wrong sign_type",
            Self::EmptySignature => "empty signature parameter",
            Self::SubscriptionDisabled => "subscribe/unsubscribe is disabled for this app",
            Self::IpNotWhitelisted => "request IP is not in the app's whitelist",
            Self::PhoneBlacklisted => "phone number is on the account blacklist",
            Self::PhoneRequestLimit => "request limit exceeded for this phone number",
            Self::SmsSignatureTakenByOtherApp => {
                "SMS signature is already fixed by another app"
            }
            Self::TemplateSignatureMismatch => {
                "template signature does not match the fixed signature"
            }
            Self::TemplateInvalid => "template is no longer valid",
            Self::PermissionDenied => "no permission to use this API",
            Self::TemplateExpired => "template has expired",
            Self::SmsSignatureNotFiled => "SMS signature has not been filed yet",
            Self::SmsSignatureAlreadyExists => "SMS signature already exists",
            Self::InvalidTimestamp => "invalid UNIX timestamp",
            Self::TimestampOutOfWindow => {
                "invalid UNIX timestamp: keep it within 6 seconds of the request time"
            }
            Self::NoAvailableSmsSignature => "no usable SMS signature for this appid",
            Self::UnknownAddressBookMode => "unknown addressbook mode",
            Self::IncorrectRecipientAddress => "incorrect recipient address",
            Self::EmptyAddressBook => "the selected address book has no contacts",
            Self::IncorrectMessageRecipient => "incorrect message recipient",
            Self::EmptyMessageAddressBook => "the selected message address book has no contacts",
            Self::ContactUnsubscribed => "contact has unsubscribed",
            Self::MissingProject => "project mark is missing",
            Self::InvalidProject => "invalid project mark",
            Self::MalformedJson => "malformed JSON in vars or links",
            Self::TagTooLong => "tag must not exceed 32 characters",
            Self::EmptySmsSignature => "SMS signature must not be empty",
            Self::SmsSignatureTooLong => "SMS signature must not exceed 40 characters",
            Self::EmptyContent => "SMS content must not be empty",
            Self::ContentTooLong => "SMS content with signature must not exceed 1000 characters",
            Self::ForbiddenWords => "SMS contains forbidden words",
            Self::EmptyProjectForContent => "project mark must not be empty",
            Self::InvalidProjectForContent => "invalid project mark",
            Self::DuplicateMessage => "identical message already sent to this contact",
            Self::ProjectUnderReview => "SMS project is under review",
            Self::InvalidMulti => "invalid multi parameter",
            Self::TemplateMissingSignature => "template must carry a 【】 signature of 2-10 characters",
            Self::TemplateSignatureTooLong => "template signature must not exceed 10 characters",
            Self::TemplateSignatureLength => "template signature must be 2-10 characters",
            Self::TemplateEmptyContent => "template content is required",
            Self::TemplateContentTooLong => "template content must not exceed 1000 characters",
            Self::TemplateTitleTooLong => "template title must not exceed 64 characters",
            Self::TemplateIdMissing => "template id to update is required",
            Self::TemplateNotFound => "template to update does not exist",
            Self::TemplateUpdateEmptyContent => "template content must not be empty",
            Self::NoMatchingTemplate => "no matching template found",
            Self::TemplateTooLong => "template must not exceed 255 characters",
            Self::InvalidAddressBookSign => "invalid target address book sign",
            Self::DailyQuotaExhausted => "daily sending quota exhausted",
            Self::InsufficientCredits => "SMS credits exhausted or insufficient",
            Self::InsufficientBalance => "account balance exhausted or insufficient",
            Self::InsufficientTransactionalBalance => "transactional SMS balance insufficient",
        }
    }

    /// Bucket of the vendor table this code belongs to.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidTimestamp | Self::TimestampOutOfWindow => ErrorCategory::Timestamp,
            Self::NoAvailableSmsSignature => ErrorCategory::SignatureAvailability,
            Self::UnknownAddressBookMode
            | Self::IncorrectRecipientAddress
            | Self::EmptyAddressBook
            | Self::InvalidAddressBookSign => ErrorCategory::AddressBook,
            Self::IncorrectMessageRecipient
            | Self::EmptyMessageAddressBook
            | Self::ContactUnsubscribed => ErrorCategory::Recipient,
            Self::MissingProject | Self::InvalidProject | Self::MalformedJson | Self::TagTooLong => {
                ErrorCategory::Project
            }
            Self::DailyQuotaExhausted
            | Self::InsufficientCredits
            | Self::InsufficientBalance
            | Self::InsufficientTransactionalBalance => ErrorCategory::Quota,
            Self::EmptySmsSignature
            | Self::SmsSignatureTooLong
            | Self::EmptyContent
            | Self::ContentTooLong
            | Self::ForbiddenWords
            | Self::EmptyProjectForContent
            | Self::InvalidProjectForContent
            | Self::DuplicateMessage
            | Self::ProjectUnderReview
            | Self::InvalidMulti
            | Self::TemplateMissingSignature
            | Self::TemplateSignatureTooLong
            | Self::TemplateSignatureLength
            | Self::TemplateEmptyContent
            | Self::TemplateContentTooLong
            | Self::TemplateTitleTooLong
            | Self::TemplateIdMissing
            | Self::TemplateNotFound
            | Self::TemplateUpdateEmptyContent
            | Self::NoMatchingTemplate
            | Self::TemplateTooLong => ErrorCategory::Content,
            _ => ErrorCategory::Application,
        }
    }

    /// Only the two timestamp codes are worth a resync retry.
    pub fn retry_class(self) -> RetryClass {
        match self {
            Self::InvalidTimestamp | Self::TimestampOutOfWindow => RetryClass::TimestampRelated,
            _ => RetryClass::NotRetryable,
        }
    }

    /// Whether this code rejects the app credentials or the request signature.
    pub fn is_auth_error(self) -> bool {
        matches!(
            self,
            Self::IncorrectAppId
                | Self::AppDisabled
                | Self::DeveloperNotEnabled
                | Self::DeveloperNotVerified
                | Self::AccountExpired
                | Self::AccountDisabled
                | Self::InvalidSignTypeValue
                | Self::InvalidSignature
                | Self::InvalidAppKey
                | Self::WrongSignType
                | Self::EmptySignature
                | Self::IpNotWhitelisted
        )
    }
}
