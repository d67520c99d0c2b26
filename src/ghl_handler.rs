use crate::errors::{AppError, ResultExt};
use crate::ghl_models::{ContactRequest, OpportunityRequest};
use crate::handlers::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: Value,
    pub duplicate: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OpportunityResponse {
    pub success: bool,
    pub opportunity: Value,
    pub message: String,
}

/// POST /api/ghl/create-contact
///
/// Relays a contact to GoHighLevel in the configured location. Custom fields
/// arrive as a `{key: value}` map and are sent as `[{key, field_value}]`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The contact to create.
///
/// # Returns
///
/// * `Result<Json<ContactResponse>, AppError>` - The created (or matched) contact or an error.
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    if request.email.is_none() && request.phone.is_none() {
        return Err(AppError::BadRequest(
            "Either email or phone is required".to_string(),
        ));
    }

    let outcome = state
        .ghl_client
        .create_contact(&request)
        .await
        .context("Failed to create contact")?;

    let message = if outcome.duplicate {
        "Contact already exists"
    } else {
        "Contact created successfully"
    };

    Ok(Json(ContactResponse {
        success: true,
        contact: outcome.contact,
        duplicate: outcome.duplicate,
        message: message.to_string(),
    }))
}

/// POST /api/ghl/create-opportunity
///
/// Creates an opportunity in the configured pipeline. Requires
/// `GHL_PIPELINE_ID`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The opportunity to create.
///
/// # Returns
///
/// * `Result<Json<OpportunityResponse>, AppError>` - The created opportunity or an error.
pub async fn create_opportunity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpportunityRequest>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let pipeline_id = state.config.pipeline_id()?;

    if request.contact_id.trim().is_empty() {
        return Err(AppError::BadRequest("contactId is required".to_string()));
    }

    let opportunity = state
        .ghl_client
        .create_opportunity(pipeline_id, &request)
        .await
        .context("Failed to create opportunity")?;

    Ok(Json(OpportunityResponse {
        success: true,
        opportunity,
        message: "Opportunity created successfully".to_string(),
    }))
}

/// GET /api/ghl/test
///
/// Checks the credentials by reading the configured location.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `(StatusCode, Json<Value>)` - 200 with the location name, or 502.
pub async fn test_connection(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<Value>) {
    tracing::info!("Testing GoHighLevel API connection");

    match state.ghl_client.get_location().await {
        Ok(location) => {
            let name = location
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown");
            tracing::info!("✓ GoHighLevel connection OK (location: {})", name);
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "GHL API connection successful",
                    "location": name,
                    "apiKeyValid": true
                })),
            )
        }
        Err(e) => {
            tracing::error!("❌ GoHighLevel connection test failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "success": false,
                    "error": "GHL API test failed",
                    "apiKeyValid": false
                })),
            )
        }
    }
}

/// GET /api/env-check
///
/// Reports which settings are present without revealing secrets.
pub async fn env_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "success": true,
        "environment": {
            "GHL_API_KEY": config.masked_api_key(),
            "GHL_LOCATION_ID": config.ghl_location_id,
            "GHL_PIPELINE_ID": config.ghl_pipeline_id.as_deref().unwrap_or("Missing"),
            "GHL_BASE_URL": config.ghl_base_url,
        },
        "message": "Environment variables check"
    }))
}
