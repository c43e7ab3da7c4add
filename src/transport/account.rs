use serde::Deserialize;

use super::TransportError;
use super::scalar::TransportScalar;
use crate::domain::{BalanceResponse, ServiceStatus, UnixTimestamp};

#[derive(Debug, Clone, Deserialize)]
struct BalanceJsonResponse {
    #[serde(default)]
    balance: Option<TransportScalar>,
    #[serde(default)]
    transactional_balance: Option<TransportScalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct TimestampJsonResponse {
    #[serde(default)]
    timestamp: Option<TransportScalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceStatusJsonResponse {
    status: String,
    #[serde(default)]
    runtime: f64,
}

pub fn decode_balance_json_response(json: &str) -> Result<BalanceResponse, TransportError> {
    let parsed: BalanceJsonResponse = serde_json::from_str(json)?;
    Ok(BalanceResponse {
        balance: parsed.balance.map(TransportScalar::into_string),
        transactional_balance: parsed
            .transactional_balance
            .map(TransportScalar::into_string),
    })
}

/// Decode `service/timestamp`: `{"timestamp": 1700000000}`.
pub fn decode_server_timestamp_json_response(json: &str) -> Result<UnixTimestamp, TransportError> {
    let parsed: TimestampJsonResponse = serde_json::from_str(json)?;
    let raw = parsed.timestamp.ok_or(TransportError::MissingField {
        field: UnixTimestamp::FIELD,
    })?;
    raw.to_i64()
        .map(UnixTimestamp::new)
        .ok_or_else(|| TransportError::InvalidValue {
            field: UnixTimestamp::FIELD,
            value: raw.into_string(),
        })
}

pub fn decode_service_status_json_response(json: &str) -> Result<ServiceStatus, TransportError> {
    let parsed: ServiceStatusJsonResponse = serde_json::from_str(json)?;
    Ok(ServiceStatus {
        status: parsed.status,
        runtime: parsed.runtime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_balance_supports_numeric_and_string_values() {
        let parsed = decode_balance_json_response(
            r#"{"status":"success","balance":"14197","transactional_balance":10.50}"#,
        )
        .unwrap();
        assert_eq!(parsed.balance.as_deref(), Some("14197"));
        assert_eq!(parsed.transactional_balance.as_deref(), Some("10.50"));

        let parsed = decode_balance_json_response(r#"{"status":"success"}"#).unwrap();
        assert_eq!(parsed.balance, None);
    }

    #[test]
    fn decode_server_timestamp_reads_seconds() {
        let parsed = decode_server_timestamp_json_response(r#"{"timestamp":1700000042}"#).unwrap();
        assert_eq!(parsed, UnixTimestamp::new(1_700_000_042));

        let parsed = decode_server_timestamp_json_response(r#"{"timestamp":"1700000042"}"#).unwrap();
        assert_eq!(parsed.value(), 1_700_000_042);
    }

    #[test]
    fn decode_server_timestamp_rejects_missing_or_invalid_values() {
        assert!(matches!(
            decode_server_timestamp_json_response("{}"),
            Err(TransportError::MissingField { field: "timestamp" })
        ));
        assert!(matches!(
            decode_server_timestamp_json_response(r#"{"timestamp":"soon"}"#),
            Err(TransportError::InvalidValue { .. })
        ));
        assert!(matches!(
            decode_server_timestamp_json_response(r#"{"timestamp":1700000042.5}"#),
            Err(TransportError::InvalidValue { .. })
        ));
    }

    #[test]
    fn decode_service_status_keeps_vendor_spelling() {
        let parsed =
            decode_service_status_json_response(r#"{"status":"runing","runtime":0.0012}"#).unwrap();
        assert!(parsed.is_running());
        assert!((parsed.runtime - 0.0012).abs() < f64::EPSILON);
    }
}
