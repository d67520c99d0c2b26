use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Body of the contact proxy endpoint, as sent by the quiz front-end.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Custom field key -> value.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

/// Contact creation body in GoHighLevel's format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhlContactPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub location_id: String,
    pub custom_fields: Vec<GhlCustomField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GhlCustomField {
    pub key: String,
    pub field_value: Value,
}

impl ContactRequest {
    pub fn to_ghl_payload(&self, location_id: &str) -> GhlContactPayload {
        GhlContactPayload {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            location_id: location_id.to_string(),
            custom_fields: self
                .custom_fields
                .iter()
                .map(|(key, value)| GhlCustomField {
                    key: key.clone(),
                    field_value: value.clone(),
                })
                .collect(),
        }
    }
}

/// A created (or already existing) GoHighLevel contact.
#[derive(Debug, Clone)]
pub struct ContactOutcome {
    pub contact: Value,
    pub contact_id: Option<String>,
    /// GoHighLevel rejected the contact as a duplicate of `contact_id`.
    pub duplicate: bool,
}

/// Body of the opportunity proxy endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityRequest {
    pub contact_id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Opportunity creation body in GoHighLevel's format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhlOpportunityPayload {
    pub name: String,
    pub status: String,
    pub contact_id: String,
    pub monetary_value: f64,
    pub pipeline_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_stage_id: Option<String>,
    pub location_id: String,
    pub source: String,
}

impl OpportunityRequest {
    pub fn to_ghl_payload(
        &self,
        pipeline_id: &str,
        stage_id: Option<String>,
        location_id: &str,
    ) -> GhlOpportunityPayload {
        GhlOpportunityPayload {
            name: self.title.clone(),
            status: self
                .status
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "open".to_string()),
            contact_id: self.contact_id.clone(),
            monetary_value: self.value.unwrap_or(0.0),
            pipeline_id: pipeline_id.to_string(),
            pipeline_stage_id: stage_id,
            location_id: location_id.to_string(),
            source: self
                .source
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "API".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Pipeline {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stages: Vec<PipelineStage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineStage {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Pipeline {
    pub const ENTRY_STAGE_NAME: &'static str = "Lead In";

    /// The stage new leads land in: "Lead In" if present, else the first stage.
    pub fn entry_stage(&self) -> Option<&PipelineStage> {
        self.stages
            .iter()
            .find(|stage| stage.name == Self::ENTRY_STAGE_NAME)
            .or_else(|| self.stages.first())
    }
}

/// GoHighLevel wraps most single-object responses (`{"contact": {...}}`);
/// returns the inner object, or the whole value when it is not wrapped.
pub fn unwrap_envelope(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).map_or(false, Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Extracts the `id` of an object, as string even when numeric.
pub fn object_id(value: &Value) -> Option<String> {
    match value.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Id of the existing contact when GoHighLevel rejects a duplicate.
///
/// The rejection looks like
/// `{"message": "This location does not allow duplicated contacts.",
///   "meta": {"contactId": "...", "matchingField": "email"}}`.
pub fn duplicate_contact_id(body: &Value) -> Option<String> {
    body.get("meta")
        .and_then(|meta| meta.get("contactId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
