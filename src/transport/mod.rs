//! Transport layer: HTTP and wire-format details (serialization/deserialization).

mod account;
mod envelope;
mod report;
mod scalar;
mod send;
mod template;

use serde::Deserialize;

use crate::domain::Status;

pub use account::{
    decode_balance_json_response, decode_server_timestamp_json_response,
    decode_service_status_json_response,
};
pub use envelope::{ErrorEnvelope, decode_error_envelope};
pub use report::{
    decode_log_json_response, decode_mo_json_response, decode_reports_json_response,
    encode_log_form, encode_mo_form, encode_reports_form,
};
pub use send::{
    decode_batch_send_json_response, decode_multi_send_json_response, decode_send_json_response,
    encode_batch_send_form, encode_batch_send_template_form, encode_multi_send_form,
    encode_multi_send_template_form, encode_send_form, encode_send_template_form,
};
pub use template::{
    decode_template_created_json_response, decode_templates_json_response,
    encode_template_request,
};

/// HTTP verb used for a SUBMAIL call.
///
/// `GET` carries its parameters in the query string, every other verb as a
/// form-encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is missing `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid value for `{field}`: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TransportStatus {
    Success,
    Error,
}

impl From<TransportStatus> for Status {
    fn from(value: TransportStatus) -> Self {
        match value {
            TransportStatus::Success => Status::Success,
            TransportStatus::Error => Status::Error,
        }
    }
}
