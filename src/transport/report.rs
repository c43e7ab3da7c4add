use serde::Deserialize;

use super::TransportError;
use super::scalar::TransportScalar;
use crate::domain::{
    DateRange, LogEntry, LogQuery, MoEntry, MoQuery, Page, ProjectId, RawPhoneNumber,
    ReportOverview, ReportsQuery, ReportsResponse, SendId, UnixTimestamp,
};
use crate::signing::ParameterSet;

const START_DATE_FIELD: &str = "start_date";
const END_DATE_FIELD: &str = "end_date";
const OFFSET_FIELD: &str = "offset";
const ROWS_FIELD: &str = "rows";
const STATUS_FIELD: &str = "status";
const FROM_FIELD: &str = "from";

#[derive(Debug, Clone, Default, Deserialize)]
struct OverviewJson {
    #[serde(default)]
    request: Option<TransportScalar>,
    // SUBMAIL spells it `deliveryed`.
    #[serde(default, alias = "deliveryed")]
    delivered: Option<TransportScalar>,
    #[serde(default)]
    dropped: Option<TransportScalar>,
    #[serde(default)]
    sending: Option<TransportScalar>,
    #[serde(default)]
    fee: Option<TransportScalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReportsJsonResponse {
    #[serde(default)]
    start_date: Option<TransportScalar>,
    #[serde(default)]
    end_date: Option<TransportScalar>,
    #[serde(default)]
    overview: Option<OverviewJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct LogJsonEntry {
    #[serde(default, alias = "sendID")]
    send_id: Option<TransportScalar>,
    #[serde(default)]
    to: Option<TransportScalar>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    fee: Option<TransportScalar>,
    #[serde(default)]
    send_at: Option<TransportScalar>,
    #[serde(default)]
    report_at: Option<TransportScalar>,
    #[serde(default)]
    report_state: Option<String>,
    #[serde(default)]
    dropped_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MoJsonEntry {
    #[serde(default)]
    from: Option<TransportScalar>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sms_content: Option<String>,
    #[serde(default)]
    reply_at: Option<TransportScalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageJsonResponse<T> {
    #[serde(default)]
    total: Option<TransportScalar>,
    #[serde(default)]
    offset: Option<TransportScalar>,
    #[serde(default = "Vec::new", alias = "mo")]
    data: Vec<T>,
}

pub fn encode_reports_form(query: &ReportsQuery) -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert_opt(ProjectId::FIELD, query.project.as_ref().map(ProjectId::as_str));
    insert_range(&mut params, &query.range);
    params
}

pub fn encode_log_form(query: &LogQuery) -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert_opt(ProjectId::FIELD, query.project.as_ref().map(ProjectId::as_str));
    params.insert_opt(RawPhoneNumber::FIELD, query.to.as_ref().map(RawPhoneNumber::raw));
    params.insert_opt(SendId::FIELD, query.send_id.as_ref().map(SendId::as_str));
    params.insert_opt(STATUS_FIELD, query.status.map(|status| status.as_str()));
    insert_range(&mut params, &query.range);
    insert_paging(&mut params, query.offset, query.rows);
    params
}

pub fn encode_mo_form(query: &MoQuery) -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert_opt(FROM_FIELD, query.from.as_ref().map(RawPhoneNumber::raw));
    insert_range(&mut params, &query.range);
    insert_paging(&mut params, query.offset, query.rows);
    params
}

fn insert_range(params: &mut ParameterSet, range: &DateRange) {
    params.insert_opt(START_DATE_FIELD, range.start_date.map(|date| date.to_string()));
    params.insert_opt(END_DATE_FIELD, range.end_date.map(|date| date.to_string()));
}

fn insert_paging(params: &mut ParameterSet, offset: Option<u32>, rows: Option<u32>) {
    params.insert_opt(OFFSET_FIELD, offset.map(|offset| offset.to_string()));
    params.insert_opt(ROWS_FIELD, rows.map(|rows| rows.to_string()));
}

pub fn decode_reports_json_response(json: &str) -> Result<ReportsResponse, TransportError> {
    let parsed: ReportsJsonResponse = serde_json::from_str(json)?;
    let overview = parsed.overview.unwrap_or_default();
    Ok(ReportsResponse {
        start_date: timestamp(START_DATE_FIELD, parsed.start_date)?,
        end_date: timestamp(END_DATE_FIELD, parsed.end_date)?,
        overview: ReportOverview {
            request: count("request", overview.request)?,
            delivered: count("delivered", overview.delivered)?,
            dropped: count("dropped", overview.dropped)?,
            sending: count("sending", overview.sending)?,
            fee: count("fee", overview.fee)?,
        },
    })
}

pub fn decode_log_json_response(json: &str) -> Result<Page<LogEntry>, TransportError> {
    let parsed: PageJsonResponse<LogJsonEntry> = serde_json::from_str(json)?;
    let rows = parsed
        .data
        .into_iter()
        .map(|entry| {
            Ok(LogEntry {
                send_id: entry.send_id.map(|id| SendId::new(id.into_string())),
                to: entry.to.map(TransportScalar::into_string),
                content: entry.content,
                fee: match entry.fee {
                    None => 0,
                    Some(raw) => raw.to_u32().ok_or_else(|| TransportError::InvalidValue {
                        field: "fee",
                        value: raw.into_string(),
                    })?,
                },
                send_at: timestamp("send_at", entry.send_at)?,
                report_at: timestamp("report_at", entry.report_at)?,
                report_state: entry.report_state,
                dropped_reason: entry.dropped_reason,
            })
        })
        .collect::<Result<Vec<_>, TransportError>>()?;
    page(parsed.total, parsed.offset, rows)
}

pub fn decode_mo_json_response(json: &str) -> Result<Page<MoEntry>, TransportError> {
    let parsed: PageJsonResponse<MoJsonEntry> = serde_json::from_str(json)?;
    let rows = parsed
        .data
        .into_iter()
        .map(|entry| {
            Ok(MoEntry {
                from: entry.from.map(TransportScalar::into_string),
                content: entry.content,
                sms_content: entry.sms_content,
                reply_at: timestamp("reply_at", entry.reply_at)?,
            })
        })
        .collect::<Result<Vec<_>, TransportError>>()?;
    page(parsed.total, parsed.offset, rows)
}

fn page<T>(
    total: Option<TransportScalar>,
    offset: Option<TransportScalar>,
    rows: Vec<T>,
) -> Result<Page<T>, TransportError> {
    let total = match total {
        Some(raw) => count("total", Some(raw))?,
        None => rows.len() as u64,
    };
    Ok(Page {
        total,
        offset: count(OFFSET_FIELD, offset)?,
        rows,
    })
}

fn count(field: &'static str, raw: Option<TransportScalar>) -> Result<u64, TransportError> {
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .to_i64()
            .and_then(|value| u64::try_from(value).ok())
            .ok_or_else(|| TransportError::InvalidValue {
                field,
                value: raw.into_string(),
            }),
    }
}

fn timestamp(
    field: &'static str,
    raw: Option<TransportScalar>,
) -> Result<Option<UnixTimestamp>, TransportError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .to_i64()
            .map(|seconds| Some(UnixTimestamp::new(seconds)))
            .ok_or_else(|| TransportError::InvalidValue {
                field,
                value: raw.into_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::DeliveryState;

    use super::*;

    #[test]
    fn encode_log_form_sends_only_given_filters() {
        let query = LogQuery {
            to: Some(RawPhoneNumber::new("13800138000").unwrap()),
            status: Some(DeliveryState::Dropped),
            range: DateRange::between(
                UnixTimestamp::new(1_700_000_000),
                UnixTimestamp::new(1_700_086_400),
            ),
            rows: Some(50),
            ..LogQuery::default()
        };
        assert_eq!(
            encode_log_form(&query).into_pairs(),
            vec![
                ("end_date".to_owned(), "1700086400".to_owned()),
                ("rows".to_owned(), "50".to_owned()),
                ("start_date".to_owned(), "1700000000".to_owned()),
                ("status".to_owned(), "dropped".to_owned()),
                ("to".to_owned(), "13800138000".to_owned()),
            ]
        );

        assert!(encode_log_form(&LogQuery::default()).is_empty());
    }

    #[test]
    fn encode_reports_and_mo_forms() {
        let reports = ReportsQuery {
            project: Some(ProjectId::new("XzyWk2").unwrap()),
            range: DateRange {
                start_date: Some(UnixTimestamp::new(1_700_000_000)),
                end_date: None,
            },
        };
        let params = encode_reports_form(&reports);
        assert_eq!(params.get("project"), Some("XzyWk2"));
        assert_eq!(params.get("start_date"), Some("1700000000"));
        assert!(!params.contains_key("end_date"));

        let mo = MoQuery {
            from: Some(RawPhoneNumber::new("13800138000").unwrap()),
            offset: Some(20),
            ..MoQuery::default()
        };
        let params = encode_mo_form(&mo);
        assert_eq!(params.get("from"), Some("13800138000"));
        assert_eq!(params.get("offset"), Some("20"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn decode_reports_reads_overview_with_vendor_spelling() {
        let json = r#"
        {
          "status": "success",
          "start_date": 1700000000,
          "end_date": "1700086400",
          "overview": {"request": 120, "deliveryed": "110", "dropped": 8, "sending": 2, "fee": 121},
          "operators": {"china_mobile": 60}
        }
        "#;
        let parsed = decode_reports_json_response(json).unwrap();
        assert_eq!(parsed.start_date, Some(UnixTimestamp::new(1_700_000_000)));
        assert_eq!(parsed.end_date, Some(UnixTimestamp::new(1_700_086_400)));
        assert_eq!(
            parsed.overview,
            ReportOverview {
                request: 120,
                delivered: 110,
                dropped: 8,
                sending: 2,
                fee: 121,
            }
        );

        let parsed = decode_reports_json_response(r#"{"status":"success"}"#).unwrap();
        assert_eq!(parsed.overview, ReportOverview::default());
    }

    #[test]
    fn decode_log_reads_rows_and_totals() {
        let json = r#"
        {
          "status": "success",
          "total": 31,
          "offset": 0,
          "row": 2,
          "data": [
            {"sendID": "s1", "to": "13800138000", "content": "hi", "fee": 1,
             "send_at": 1700000000, "report_at": "1700000003", "report_state": "delivered"},
            {"send_id": "s2", "to": 13900139000, "report_state": "dropped", "dropped_reason": "blacklist"}
          ]
        }
        "#;
        let parsed = decode_log_json_response(json).unwrap();
        assert_eq!(parsed.total, 31);
        assert_eq!(parsed.rows.len(), 2);

        let first = &parsed.rows[0];
        assert_eq!(first.send_id.as_ref().map(SendId::as_str), Some("s1"));
        assert_eq!(first.fee, 1);
        assert_eq!(first.report_at, Some(UnixTimestamp::new(1_700_000_003)));

        let second = &parsed.rows[1];
        assert_eq!(second.to.as_deref(), Some("13900139000"));
        assert_eq!(second.fee, 0);
        assert_eq!(second.send_at, None);
        assert_eq!(second.dropped_reason.as_deref(), Some("blacklist"));
    }

    #[test]
    fn decode_mo_accepts_mo_key_and_counts_rows_without_total() {
        let json = r#"{"status":"success","mo":[{"from":"13800138000","content":"TD","reply_at":1700000100}]}"#;
        let parsed = decode_mo_json_response(json).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.rows[0].from.as_deref(), Some("13800138000"));
        assert_eq!(parsed.rows[0].reply_at, Some(UnixTimestamp::new(1_700_000_100)));
    }

    #[test]
    fn decode_log_rejects_non_numeric_counters() {
        assert!(matches!(
            decode_log_json_response(r#"{"total":"many","data":[]}"#),
            Err(TransportError::InvalidValue { field: "total", .. })
        ));
    }
}
