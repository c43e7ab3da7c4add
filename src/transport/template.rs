use serde::Deserialize;

use super::scalar::TransportScalar;
use super::{Method, TransportError};
use crate::domain::{
    SmsSignature, Template, TemplateCreated, TemplateDraft, TemplateId,
    TemplateRequest, TemplatesResponse, UnixTimestamp,
};
use crate::signing::ParameterSet;

const SMS_TITLE_FIELD: &str = "sms_title";
const SMS_CONTENT_FIELD: &str = "sms_content";

#[derive(Debug, Clone, Deserialize)]
struct TemplatesJsonResponse {
    #[serde(default)]
    templates: Option<Vec<TemplateJson>>,
    #[serde(default)]
    template: Option<TemplateJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateJson {
    template_id: TransportScalar,
    #[serde(default)]
    sms_title: Option<String>,
    #[serde(default)]
    sms_signature: Option<String>,
    #[serde(default)]
    sms_content: Option<String>,
    #[serde(default)]
    add_date: Option<TransportScalar>,
    #[serde(default)]
    edit_date: Option<TransportScalar>,
    #[serde(default)]
    template_status: Option<TransportScalar>,
    #[serde(default)]
    template_status_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateCreatedJsonResponse {
    #[serde(default)]
    template_id: Option<TransportScalar>,
}

/// HTTP verb and parameters for one `sms/template` operation.
pub fn encode_template_request(request: &TemplateRequest) -> (Method, ParameterSet) {
    let mut params = ParameterSet::new();
    let method = match request {
        TemplateRequest::Get(id) => {
            params.insert_opt(TemplateId::FIELD, id.as_ref().map(TemplateId::as_str));
            Method::Get
        }
        TemplateRequest::Create(draft) => {
            push_draft(&mut params, draft);
            Method::Post
        }
        TemplateRequest::Update(id, draft) => {
            params.insert(TemplateId::FIELD, id.as_str());
            push_draft(&mut params, draft);
            Method::Put
        }
        TemplateRequest::Delete(id) => {
            params.insert(TemplateId::FIELD, id.as_str());
            Method::Delete
        }
    };
    (method, params)
}

fn push_draft(params: &mut ParameterSet, draft: &TemplateDraft) {
    params.insert_opt(SMS_TITLE_FIELD, draft.title());
    params.insert(SmsSignature::FIELD, draft.sms_signature().as_str());
    params.insert(SMS_CONTENT_FIELD, draft.content().as_str());
}

/// Accepts both the list shape (`templates`) and the single-template shape
/// (`template`) returned when an id is given.
pub fn decode_templates_json_response(json: &str) -> Result<TemplatesResponse, TransportError> {
    let parsed: TemplatesJsonResponse = serde_json::from_str(json)?;
    let raw = match (parsed.templates, parsed.template) {
        (Some(list), _) => list,
        (None, Some(single)) => vec![single],
        (None, None) => Vec::new(),
    };

    let templates = raw
        .into_iter()
        .map(template_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TemplatesResponse { templates })
}

pub fn decode_template_created_json_response(
    json: &str,
) -> Result<TemplateCreated, TransportError> {
    let parsed: TemplateCreatedJsonResponse = serde_json::from_str(json)?;
    let raw = parsed.template_id.ok_or(TransportError::MissingField {
        field: TemplateId::FIELD,
    })?;
    Ok(TemplateCreated {
        template_id: template_id(raw)?,
    })
}

fn template_from_json(value: TemplateJson) -> Result<Template, TransportError> {
    Ok(Template {
        template_id: template_id(value.template_id)?,
        sms_title: value.sms_title,
        sms_signature: value.sms_signature,
        sms_content: value.sms_content,
        add_date: value.add_date.as_ref().and_then(timestamp),
        edit_date: value.edit_date.as_ref().and_then(timestamp),
        template_status: value.template_status.map(TransportScalar::into_string),
        template_status_description: value.template_status_description,
    })
}

fn template_id(raw: TransportScalar) -> Result<TemplateId, TransportError> {
    let value = raw.into_string();
    TemplateId::new(value.clone()).map_err(|_| TransportError::InvalidValue {
        field: TemplateId::FIELD,
        value,
    })
}

fn timestamp(raw: &TransportScalar) -> Option<UnixTimestamp> {
    raw.to_i64().map(UnixTimestamp::new)
}

#[cfg(test)]
mod tests {
    use crate::domain::MessageText;

    use super::*;

    fn draft() -> TemplateDraft {
        TemplateDraft::new(
            SmsSignature::new("【SUBMAIL】").unwrap(),
            MessageText::new("your code is @var(code)").unwrap(),
        )
        .with_title("login code")
        .unwrap()
    }

    #[test]
    fn encode_maps_each_operation_to_its_verb() {
        let (method, params) = encode_template_request(&TemplateRequest::Get(None));
        assert_eq!(method, Method::Get);
        assert!(params.is_empty());

        let id = TemplateId::new("tpl-1").unwrap();
        let (method, params) = encode_template_request(&TemplateRequest::Get(Some(id.clone())));
        assert_eq!(method, Method::Get);
        assert_eq!(params.get("template_id"), Some("tpl-1"));

        let (method, params) = encode_template_request(&TemplateRequest::Create(draft()));
        assert_eq!(method, Method::Post);
        assert_eq!(
            params.into_pairs(),
            vec![
                ("sms_content".to_owned(), "your code is @var(code)".to_owned()),
                ("sms_signature".to_owned(), "【SUBMAIL】".to_owned()),
                ("sms_title".to_owned(), "login code".to_owned()),
            ]
        );

        let (method, params) =
            encode_template_request(&TemplateRequest::Update(id.clone(), draft()));
        assert_eq!(method, Method::Put);
        assert_eq!(params.get("template_id"), Some("tpl-1"));
        assert_eq!(params.get("sms_title"), Some("login code"));

        let (method, params) = encode_template_request(&TemplateRequest::Delete(id));
        assert_eq!(method, Method::Delete);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn decode_template_list() {
        let json = r#"
        {
          "status": "success",
          "templates": [
            {
              "template_id": "tpl-1",
              "sms_title": "login code",
              "sms_signature": "【SUBMAIL】",
              "sms_content": "your code is @var(code)",
              "add_date": 1700000000,
              "edit_date": "1700000100",
              "template_status": "2",
              "template_status_description": "approved"
            }
          ]
        }
        "#;
        let parsed = decode_templates_json_response(json).unwrap();
        assert_eq!(parsed.templates.len(), 1);

        let template = &parsed.templates[0];
        assert_eq!(template.template_id.as_str(), "tpl-1");
        assert_eq!(template.add_date, Some(UnixTimestamp::new(1_700_000_000)));
        assert_eq!(template.edit_date, Some(UnixTimestamp::new(1_700_000_100)));
        assert_eq!(template.template_status.as_deref(), Some("2"));
        assert_eq!(
            template.template_status_description.as_deref(),
            Some("approved")
        );
    }

    #[test]
    fn decode_single_template_and_empty_list() {
        let json = r#"{"status":"success","template":{"template_id":"tpl-9"}}"#;
        let parsed = decode_templates_json_response(json).unwrap();
        assert_eq!(parsed.templates.len(), 1);
        assert_eq!(parsed.templates[0].sms_content, None);

        let parsed = decode_templates_json_response(r#"{"status":"success"}"#).unwrap();
        assert!(parsed.templates.is_empty());
    }

    #[test]
    fn decode_template_created_requires_id() {
        let parsed =
            decode_template_created_json_response(r#"{"status":"success","template_id":"tpl-2"}"#)
                .unwrap();
        assert_eq!(parsed.template_id.as_str(), "tpl-2");

        assert!(matches!(
            decode_template_created_json_response(r#"{"status":"success"}"#),
            Err(TransportError::MissingField {
                field: "template_id"
            })
        ));
    }
}
