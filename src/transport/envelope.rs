use serde::Deserialize;

use super::TransportError;
use super::scalar::TransportScalar;
use crate::domain::ErrorCode;

/// Vendor error reported in a response body: `{"status":"error","code":..,"msg":..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusProbe {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<TransportScalar>,
    #[serde(default)]
    msg: Option<String>,
}

/// Detect a top-level error envelope.
///
/// Returns `Ok(None)` for anything that is not an error object, including the
/// JSON arrays returned by the multi-send endpoints. `code` may arrive as a
/// number or a numeric string.
pub fn decode_error_envelope(json: &str) -> Result<Option<ErrorEnvelope>, TransportError> {
    if json.trim_start().starts_with('[') {
        return Ok(None);
    }

    let probe: StatusProbe = serde_json::from_str(json)?;
    if probe.status.as_deref() != Some("error") {
        return Ok(None);
    }

    let raw = probe
        .code
        .ok_or(TransportError::MissingField { field: "code" })?;
    let code = raw
        .to_i64()
        .and_then(|code| i32::try_from(code).ok())
        .ok_or_else(|| TransportError::InvalidValue {
            field: "code",
            value: raw.clone().into_string(),
        })?;

    Ok(Some(ErrorEnvelope {
        code: ErrorCode::new(code),
        msg: probe.msg,
    }))
}
