use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    errors::{AppError, ResultExt},
    ghl_models::{object_id, ContactOutcome},
    handlers::AppState,
    leads::{contact_request, lead_fingerprint, opportunity_request, validate_lead, ValidatedLead},
    models::{LeadInfo, QuizAnswers},
    quote::QuoteSummary,
    scoring::{summarize, QuoteEstimate},
};

/// Lead form submission: contact details plus the finished quiz.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadSubmission {
    pub lead: LeadInfo,
    #[serde(default)]
    pub answers: QuizAnswers,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmissionResponse {
    pub success: bool,
    pub message: String,
    pub contact_id: Option<String>,
    pub opportunity_id: Option<String>,
    /// The same lead was already submitted recently or already exists in the CRM.
    pub duplicate: bool,
    pub quote: QuoteSummary,
}

/// Lead submission handler.
///
/// Flow:
/// 1. Validate contact details and consent.
/// 2. Score the answers and estimate the cost.
/// 3. Skip resubmissions seen in the last few minutes or still in flight.
/// 4. Create the contact in GoHighLevel with the quiz as custom fields.
/// 5. Create an opportunity valued at the estimate (when a pipeline is configured).
///
/// Fallback: if the opportunity fails, the contact is kept and the lead still
/// counts as submitted.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `submission` - The lead form plus the quiz answers.
///
/// # Returns
///
/// * `Result<impl IntoResponse, AppError>` - 201 for a new lead, 200 for a duplicate, or an error.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<LeadSubmission>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("📨 Received lead submission");

    // Step 1: Validate
    let lead = validate_lead(&submission.lead, &submission.answers.zip)?;

    // Step 2: Score
    let estimate = summarize(&submission.answers);
    let quote = QuoteSummary::new(&submission.answers, estimate);
    tracing::info!(
        "Lead {} scored {} (tier {}), estimate {}",
        lead.email,
        estimate.score,
        estimate.tier.level(),
        quote.formatted_cost
    );

    // Step 3: Duplicate submission check
    let fingerprint = lead_fingerprint(&lead);
    if let Some(contact_id) = state.recent_leads.get(&fingerprint).await {
        tracing::warn!("⚠️  Duplicate lead submission for contact {}", contact_id);
        return Ok(duplicate_response(
            "Lead already submitted (duplicate)",
            Some(contact_id),
            quote,
        ));
    }

    // ATOMIC DEDUPLICATION: first request to claim the fingerprint does the CRM work
    let now = Utc::now().timestamp();
    let claim = state
        .processing_leads
        .entry(fingerprint.clone())
        .or_insert_with(async move { now })
        .await;
    if !claim.is_fresh() {
        tracing::warn!(
            "⏭ DUPLICATE REQUEST BLOCKED - lead {} already being processed ({} seconds ago)",
            lead.email,
            now - claim.into_value()
        );
        return Ok(duplicate_response(
            "Lead already being processed (duplicate)",
            None,
            quote,
        ));
    }

    // Double-check: a request that finished between our lookup and the claim
    if let Some(contact_id) = state.recent_leads.get(&fingerprint).await {
        state.processing_leads.invalidate(&fingerprint).await;
        return Ok(duplicate_response(
            "Lead already submitted (duplicate)",
            Some(contact_id),
            quote,
        ));
    }

    let result = forward_to_crm(&state, &lead, &submission.answers, &estimate).await;
    if let Ok((ref contact, _)) = result {
        if let Some(ref contact_id) = contact.contact_id {
            state
                .recent_leads
                .insert(fingerprint.clone(), contact_id.clone())
                .await;
        }
    }
    // Claim is dropped on failure as well
    state.processing_leads.invalidate(&fingerprint).await;

    let (contact, opportunity_id) = result?;
    let contact_id = contact.contact_id.clone().ok_or_else(|| {
        AppError::ExternalApiError("Contact creation response missing 'id' field".to_string())
    })?;

    tracing::info!(
        "✅ Lead submitted: contact={}, opportunity={:?}",
        contact_id,
        opportunity_id
    );

    let message = if contact.duplicate {
        "Lead matched an existing contact"
    } else {
        "Lead created successfully"
    };

    Ok((
        StatusCode::CREATED,
        Json(LeadSubmissionResponse {
            success: true,
            message: message.to_string(),
            contact_id: Some(contact_id),
            opportunity_id,
            duplicate: contact.duplicate,
            quote,
        }),
    ))
}

fn duplicate_response(
    message: &str,
    contact_id: Option<String>,
    quote: QuoteSummary,
) -> (StatusCode, Json<LeadSubmissionResponse>) {
    (
        StatusCode::OK,
        Json(LeadSubmissionResponse {
            success: true,
            message: message.to_string(),
            contact_id,
            opportunity_id: None,
            duplicate: true,
            quote,
        }),
    )
}

/// Steps 4 and 5: the contact, then the opportunity when a pipeline is
/// configured. An opportunity failure is logged and yields `None`.
async fn forward_to_crm(
    state: &AppState,
    lead: &ValidatedLead,
    answers: &QuizAnswers,
    estimate: &QuoteEstimate,
) -> Result<(ContactOutcome, Option<String>), AppError> {
    // Step 4: Contact
    let contact = state
        .ghl_client
        .create_contact(&contact_request(lead, answers, estimate))
        .await
        .context("Failed to create contact")?;

    let Some(contact_id) = contact.contact_id.as_deref() else {
        return Ok((contact, None));
    };

    // Step 5: Opportunity
    let opportunity_id = match state.config.ghl_pipeline_id.as_deref() {
        Some(pipeline_id) => {
            let request = opportunity_request(lead, contact_id, estimate);
            match state
                .ghl_client
                .create_opportunity(pipeline_id, &request)
                .await
            {
                Ok(opportunity) => object_id(&opportunity),
                Err(e) => {
                    tracing::warn!(
                        "⚠️  Opportunity creation failed for contact {}: {}",
                        contact_id,
                        e
                    );
                    None
                }
            }
        }
        None => {
            tracing::debug!("No pipeline configured, skipping opportunity");
            None
        }
    };

    Ok((contact, opportunity_id))
}
