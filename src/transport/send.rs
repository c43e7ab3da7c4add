use serde::{Deserialize, Serialize};

use super::scalar::TransportScalar;
use super::{TransportError, TransportStatus};
use crate::domain::{
    BatchSend, BatchSendResponse, BatchSendTemplate, ErrorCode, MessageText, MultiRecipient,
    MultiSend, MultiSendResult, MultiSendTemplate, ProjectId, RawPhoneNumber, SendId,
    SendResponse, SendSms, SendTemplate, SmsSignature, Tag, TemplateVars,
};
use crate::signing::ParameterSet;

const VARS_FIELD: &str = "vars";
const MULTI_FIELD: &str = "multi";

#[derive(Debug, Clone, Deserialize)]
struct SendJsonResponse {
    #[serde(default)]
    send_id: Option<TransportScalar>,
    #[serde(default)]
    fee: Option<TransportScalar>,
    #[serde(default)]
    sms_credits: Option<TransportScalar>,
    #[serde(default)]
    transactional_sms_credits: Option<TransportScalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct MultiSendJsonResult {
    status: TransportStatus,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    send_id: Option<TransportScalar>,
    #[serde(default)]
    fee: Option<TransportScalar>,
    #[serde(default)]
    code: Option<TransportScalar>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchSendJsonResponse {
    #[serde(default, alias = "batch_list")]
    batchlist: Option<TransportScalar>,
    #[serde(default)]
    total_fee: Option<TransportScalar>,
    #[serde(default)]
    responses: Vec<MultiSendJsonResult>,
}

#[derive(Debug, Serialize)]
struct MultiJsonEntry<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "TemplateVars::is_empty")]
    vars: &'a TemplateVars,
}

pub fn encode_send_form(request: &SendSms) -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert(RawPhoneNumber::FIELD, request.to().raw());
    params.insert(MessageText::FIELD, request.content().as_str());
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    params
}

/// `vars` is sent as a JSON object and omitted when empty.
pub fn encode_send_template_form(request: &SendTemplate) -> Result<ParameterSet, TransportError> {
    let mut params = ParameterSet::new();
    params.insert(RawPhoneNumber::FIELD, request.to().raw());
    params.insert(ProjectId::FIELD, request.project().as_str());
    if !request.vars().is_empty() {
        params.insert(VARS_FIELD, serde_json::to_string(request.vars())?);
    }
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    params.insert_opt(
        SmsSignature::FIELD,
        request.sms_signature().map(SmsSignature::as_str),
    );
    Ok(params)
}

pub fn encode_multi_send_form(request: &MultiSend) -> Result<ParameterSet, TransportError> {
    let mut params = ParameterSet::new();
    params.insert(MessageText::FIELD, request.content().as_str());
    params.insert(MULTI_FIELD, encode_multi(request.multi())?);
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    Ok(params)
}

pub fn encode_multi_send_template_form(
    request: &MultiSendTemplate,
) -> Result<ParameterSet, TransportError> {
    let mut params = ParameterSet::new();
    params.insert(ProjectId::FIELD, request.project().as_str());
    params.insert(MULTI_FIELD, encode_multi(request.multi())?);
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    Ok(params)
}

/// `to` is sent as a JSON array of numbers.
pub fn encode_batch_send_form(request: &BatchSend) -> Result<ParameterSet, TransportError> {
    let mut params = ParameterSet::new();
    params.insert(RawPhoneNumber::FIELD, encode_recipients(request.to())?);
    params.insert(MessageText::FIELD, request.content().as_str());
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    Ok(params)
}

pub fn encode_batch_send_template_form(
    request: &BatchSendTemplate,
) -> Result<ParameterSet, TransportError> {
    let mut params = ParameterSet::new();
    params.insert(RawPhoneNumber::FIELD, encode_recipients(request.to())?);
    params.insert(ProjectId::FIELD, request.project().as_str());
    if !request.vars().is_empty() {
        params.insert(VARS_FIELD, serde_json::to_string(request.vars())?);
    }
    params.insert_opt(Tag::FIELD, request.tag().map(Tag::as_str));
    Ok(params)
}

fn encode_recipients(to: &[RawPhoneNumber]) -> Result<String, TransportError> {
    let raw = to.iter().map(RawPhoneNumber::raw).collect::<Vec<_>>();
    Ok(serde_json::to_string(&raw)?)
}

fn encode_multi(multi: &[MultiRecipient]) -> Result<String, TransportError> {
    let entries = multi
        .iter()
        .map(|recipient| MultiJsonEntry {
            to: recipient.to.raw(),
            vars: &recipient.vars,
        })
        .collect::<Vec<_>>();
    Ok(serde_json::to_string(&entries)?)
}

pub fn decode_send_json_response(json: &str) -> Result<SendResponse, TransportError> {
    let parsed: SendJsonResponse = serde_json::from_str(json)?;
    let send_id = parsed
        .send_id
        .ok_or(TransportError::MissingField {
            field: SendId::FIELD,
        })?
        .into_string();

    Ok(SendResponse {
        send_id: SendId::new(send_id),
        fee: parse_fee(parsed.fee)?,
        sms_credits: parsed.sms_credits.map(TransportScalar::into_string),
        transactional_sms_credits: parsed
            .transactional_sms_credits
            .map(TransportScalar::into_string),
    })
}

/// Decode the per-recipient array returned by `multisend` / `multixsend`.
pub fn decode_multi_send_json_response(json: &str) -> Result<Vec<MultiSendResult>, TransportError> {
    let parsed: Vec<MultiSendJsonResult> = serde_json::from_str(json)?;
    decode_results(parsed)
}

pub fn decode_batch_send_json_response(json: &str) -> Result<BatchSendResponse, TransportError> {
    let parsed: BatchSendJsonResponse = serde_json::from_str(json)?;
    let responses = decode_results(parsed.responses)?;
    let total_fee = match parsed.total_fee {
        Some(fee) => parse_fee(Some(fee))?,
        None => responses.iter().map(|result| result.fee).sum(),
    };
    Ok(BatchSendResponse {
        batch_list: parsed.batchlist.map(TransportScalar::into_string),
        total_fee,
        responses,
    })
}

fn decode_results(results: Vec<MultiSendJsonResult>) -> Result<Vec<MultiSendResult>, TransportError> {
    results
        .into_iter()
        .map(|item| {
            let code = match item.code {
                Some(raw) => Some(parse_code(raw)?),
                None => None,
            };
            Ok(MultiSendResult {
                to: item.to.unwrap_or_default(),
                status: item.status.into(),
                send_id: item.send_id.map(|id| SendId::new(id.into_string())),
                fee: parse_fee(item.fee)?,
                code,
                msg: item.msg,
            })
        })
        .collect()
}

fn parse_fee(fee: Option<TransportScalar>) -> Result<u32, TransportError> {
    match fee {
        None => Ok(0),
        Some(raw) => raw.to_u32().ok_or_else(|| TransportError::InvalidValue {
            field: "fee",
            value: raw.into_string(),
        }),
    }
}

fn parse_code(raw: TransportScalar) -> Result<ErrorCode, TransportError> {
    raw.to_i64()
        .and_then(|code| i32::try_from(code).ok())
        .map(ErrorCode::new)
        .ok_or_else(|| TransportError::InvalidValue {
            field: "code",
            value: raw.into_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::domain::{MessageText, ProjectId, RawPhoneNumber, Status};

    use super::*;

    fn phone(raw: &str) -> RawPhoneNumber {
        RawPhoneNumber::new(raw).unwrap()
    }

    #[test]
    fn encode_send_form_params() {
        let request = SendSms::new(phone("13800138000"), MessageText::new("hello").unwrap())
            .with_tag(Tag::new("welcome").unwrap());
        let params = encode_send_form(&request);

        assert_eq!(
            params.into_pairs(),
            vec![
                ("content".to_owned(), "hello".to_owned()),
                ("tag".to_owned(), "welcome".to_owned()),
                ("to".to_owned(), "13800138000".to_owned()),
            ]
        );
    }

    #[test]
    fn encode_send_template_serializes_vars_and_omits_empty_ones() {
        let request = SendTemplate::new(phone("13800138000"), ProjectId::new("XzyWk2").unwrap())
            .var("code", "1234")
            .var("minutes", "5")
            .with_sms_signature(SmsSignature::new("【SUBMAIL】").unwrap());
        let params = encode_send_template_form(&request).unwrap();
        assert_eq!(params.get("vars"), Some(r#"{"code":"1234","minutes":"5"}"#));
        assert_eq!(params.get("project"), Some("XzyWk2"));
        assert_eq!(params.get("sms_signature"), Some("【SUBMAIL】"));
        assert_eq!(params.get("tag"), None);

        let bare = SendTemplate::new(phone("13800138000"), ProjectId::new("XzyWk2").unwrap());
        let params = encode_send_template_form(&bare).unwrap();
        assert!(!params.contains_key("vars"));
    }

    #[test]
    fn encode_multi_send_renders_multi_as_json_array() {
        let multi = vec![
            MultiRecipient::new(phone("13800138000")).var("name", "Li"),
            MultiRecipient::new(phone("13900139000")),
        ];
        let request = MultiSend::new(MessageText::new("hi @var(name)").unwrap(), multi).unwrap();
        let params = encode_multi_send_form(&request).unwrap();

        assert_eq!(params.get("content"), Some("hi @var(name)"));
        assert_eq!(
            params.get("multi"),
            Some(r#"[{"to":"13800138000","vars":{"name":"Li"}},{"to":"13900139000"}]"#)
        );
    }

    #[test]
    fn encode_multi_send_template_uses_project() {
        let multi = vec![MultiRecipient::new(phone("13800138000")).var("code", "42")];
        let request =
            MultiSendTemplate::new(ProjectId::new("XzyWk2").unwrap(), multi).unwrap();
        let params = encode_multi_send_template_form(&request).unwrap();

        assert_eq!(params.get("project"), Some("XzyWk2"));
        assert!(!params.contains_key("content"));
        assert_eq!(
            params.get("multi"),
            Some(r#"[{"to":"13800138000","vars":{"code":"42"}}]"#)
        );
    }

    #[test]
    fn decode_send_response_accepts_numeric_or_string_fields() {
        let json = r#"
        {
          "status": "success",
          "send_id": "093c0a7df143c087d6cba9cdf0cf3738",
          "fee": 1,
          "sms_credits": "14197"
        }
        "#;
        let parsed = decode_send_json_response(json).unwrap();
        assert_eq!(parsed.send_id.as_str(), "093c0a7df143c087d6cba9cdf0cf3738");
        assert_eq!(parsed.fee, 1);
        assert_eq!(parsed.sms_credits.as_deref(), Some("14197"));
        assert_eq!(parsed.transactional_sms_credits, None);

        let json = r#"{"status":"success","send_id":12345,"fee":"2"}"#;
        let parsed = decode_send_json_response(json).unwrap();
        assert_eq!(parsed.send_id.as_str(), "12345");
        assert_eq!(parsed.fee, 2);
    }

    #[test]
    fn decode_send_response_requires_send_id() {
        assert!(matches!(
            decode_send_json_response(r#"{"status":"success","fee":1}"#),
            Err(TransportError::MissingField { field: "send_id" })
        ));
    }

    #[test]
    fn decode_multi_send_maps_per_recipient_results() {
        let json = r#"
        [
          {"status":"success","to":"13800138000","send_id":"a1","fee":1,"sms_credits":"100"},
          {"status":"error","to":"1390013","code":"252","msg":"Incorrect recipient"}
        ]
        "#;
        let parsed = decode_multi_send_json_response(json).unwrap();
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0].status, Status::Success);
        assert_eq!(parsed[0].send_id.as_ref().map(SendId::as_str), Some("a1"));
        assert_eq!(parsed[0].fee, 1);
        assert_eq!(parsed[0].code, None);

        assert_eq!(parsed[1].status, Status::Error);
        assert_eq!(parsed[1].to, "1390013");
        assert_eq!(parsed[1].code, Some(ErrorCode::new(252)));
        assert_eq!(parsed[1].fee, 0);
        assert_eq!(parsed[1].msg.as_deref(), Some("Incorrect recipient"));
    }

    #[test]
    fn encode_batch_send_lists_recipients_as_json() {
        let to = vec![phone("13800138000"), phone("13900139000")];
        let request = BatchSend::new(to, MessageText::new("hi").unwrap()).unwrap();
        let params = encode_batch_send_form(&request).unwrap();

        assert_eq!(params.get("to"), Some(r#"["13800138000","13900139000"]"#));
        assert_eq!(params.get("content"), Some("hi"));
        assert!(!params.contains_key("tag"));
    }

    #[test]
    fn encode_batch_send_template_sends_shared_vars() {
        let request =
            BatchSendTemplate::new(vec![phone("13800138000")], ProjectId::new("XzyWk2").unwrap())
                .unwrap()
                .var("code", "42")
                .with_tag(Tag::new("batch").unwrap());
        let params = encode_batch_send_template_form(&request).unwrap();

        assert_eq!(params.get("to"), Some(r#"["13800138000"]"#));
        assert_eq!(params.get("project"), Some("XzyWk2"));
        assert_eq!(params.get("vars"), Some(r#"{"code":"42"}"#));
        assert_eq!(params.get("tag"), Some("batch"));
    }

    #[test]
    fn decode_batch_send_reads_batch_id_and_results() {
        let json = r#"
        {
          "status": "success",
          "batchlist": "b7c1",
          "total_fee": "2",
          "responses": [
            {"status":"success","to":"13800138000","send_id":"s1","fee":1},
            {"status":"success","to":"13900139000","send_id":"s2","fee":1},
            {"status":"error","to":"139","code":252,"msg":"Incorrect recipient"}
          ]
        }
        "#;
        let parsed = decode_batch_send_json_response(json).unwrap();
        assert_eq!(parsed.batch_list.as_deref(), Some("b7c1"));
        assert_eq!(parsed.total_fee, 2);
        assert_eq!(parsed.responses.len(), 3);
        assert_eq!(parsed.responses[2].code, Some(ErrorCode::new(252)));

        let parsed = decode_batch_send_json_response(
            r#"{"status":"success","responses":[{"status":"success","fee":3}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.batch_list, None);
        assert_eq!(parsed.total_fee, 3);
    }
}
