use crate::collector::{Advance, AnswerCollector, StepAnswer};
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::ghl_client::GhlClient;
use crate::models::{LeadInfo, QuizAnswers};
use crate::quote::{render_report_html, QuoteSummary, REPORT_FILENAME};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use moka::future::Cache;
use moka::ops::compute::Op;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the GoHighLevel CRM.
    pub ghl_client: GhlClient,
    /// In-progress quizzes, keyed by session id. Relays answers between pages;
    /// entries expire after an hour.
    pub quiz_sessions: Cache<Uuid, AnswerCollector>,
    /// Recently submitted leads to reject double submissions.
    /// Key: lead fingerprint, Value: GoHighLevel contact id.
    pub recent_leads: Cache<String, String>,
    /// Leads whose CRM calls are in flight.
    /// Key: lead fingerprint, Value: unix timestamp the claim was taken.
    pub processing_leads: Cache<String, i64>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let ghl_client = GhlClient::new(&config)?;
        Ok(Self::with_client(config, ghl_client))
    }

    pub fn with_client(config: Config, ghl_client: GhlClient) -> Self {
        // 1 hour TTL, 10k max sessions
        let quiz_sessions = Cache::builder()
            .time_to_live(Duration::from_secs(3600))
            .max_capacity(10_000)
            .build();

        // 5 minute window covers double clicks and resubmits
        let recent_leads = Cache::builder()
            .time_to_live(Duration::from_secs(300))
            .max_capacity(10_000)
            .build();

        // Claims outlive the slowest CRM round trip (timeouts plus retries)
        let processing_leads = Cache::builder()
            .time_to_live(Duration::from_secs(300))
            .max_capacity(10_000)
            .build();

        Self {
            config,
            ghl_client,
            quiz_sessions,
            recent_leads,
            processing_leads,
        }
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "ev-quote-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/quiz/score
///
/// Scores a complete or partial set of answers. Never fails on content:
/// unknown choices simply do not count.
///
/// # Arguments
///
/// * `answers` - The quiz answers, complete or partial.
///
/// # Returns
///
/// * `Json<QuoteSummary>` - The score, tier and cost estimate.
pub async fn score_quiz(Json(answers): Json<QuizAnswers>) -> Json<QuoteSummary> {
    let summary = QuoteSummary::from_answers(&answers);
    tracing::debug!(
        "Scored quiz: score={}, tier={}, cost={}",
        summary.score,
        summary.tier.level(),
        summary.installation_cost
    );
    Json(summary)
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub answers: QuizAnswers,
    #[serde(default)]
    pub lead: Option<LeadInfo>,
}

/// POST /api/quiz/report
///
/// Returns the quote as a downloadable HTML page.
///
/// # Arguments
///
/// * `request` - JSON body with the answers and optional lead details.
///
/// # Returns
///
/// * `impl IntoResponse` - The HTML quote as an attachment.
pub async fn download_report(Json(request): Json<ReportRequest>) -> impl IntoResponse {
    let html = render_report_html(&request.answers, request.lead.as_ref());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            ),
        ],
        html,
    )
}

/// Snapshot of a quiz session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSessionView {
    pub id: Uuid,
    pub step: u32,
    pub total_steps: u32,
    pub progress: u32,
    pub completed: bool,
    pub answers: QuizAnswers,
}

impl QuizSessionView {
    fn new(id: Uuid, collector: &AnswerCollector) -> Self {
        Self {
            id,
            step: collector.current_step().number(),
            total_steps: crate::collector::QuizStep::TOTAL,
            progress: collector.progress(),
            completed: collector.is_frozen(),
            answers: collector.answers().clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Answers saved by an earlier visit.
    #[serde(default)]
    pub answers: Option<QuizAnswers>,
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Quiz session {} not found or expired", id))
}

async fn load_session(state: &AppState, id: Uuid) -> Result<AnswerCollector, AppError> {
    state
        .quiz_sessions
        .get(&id)
        .await
        .ok_or_else(|| session_not_found(id))
}

/// Applies `update` to a stored session as one atomic read-modify-write.
///
/// The entry is only written back when `update` succeeds; a missing or
/// expired session yields `NotFound`.
async fn update_session<F>(
    state: &AppState,
    id: Uuid,
    update: F,
) -> Result<AnswerCollector, AppError>
where
    F: FnOnce(&mut AnswerCollector) -> Result<(), AppError>,
{
    let mut outcome = Err(session_not_found(id));

    state
        .quiz_sessions
        .entry(id)
        .and_compute_with(|existing| {
            let op = match existing {
                Some(entry) => {
                    let mut collector = entry.into_value();
                    match update(&mut collector) {
                        Ok(()) => {
                            outcome = Ok(collector.clone());
                            Op::Put(collector)
                        }
                        Err(e) => {
                            outcome = Err(e);
                            Op::Nop
                        }
                    }
                }
                None => Op::Nop,
            };
            std::future::ready(op)
        })
        .await;

    outcome
}

/// POST /api/quiz/sessions
///
/// Starts a quiz at step 1, optionally resuming saved answers.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - Optional JSON body with answers saved by an earlier visit.
///
/// # Returns
///
/// * `(StatusCode, Json<QuizSessionView>)` - 201 with the new session.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    request: Option<Json<StartSessionRequest>>,
) -> (StatusCode, Json<QuizSessionView>) {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let collector = match request.answers {
        Some(answers) => AnswerCollector::with_answers(answers),
        None => AnswerCollector::new(),
    };

    let id = Uuid::new_v4();
    state.quiz_sessions.insert(id, collector.clone()).await;
    tracing::info!("Started quiz session {}", id);

    (
        StatusCode::CREATED,
        Json(QuizSessionView::new(id, &collector)),
    )
}

/// GET /api/quiz/sessions/:id
///
/// Reads a session without changing it.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `id` - The session UUID.
///
/// # Returns
///
/// * `Result<Json<QuizSessionView>, AppError>` - The session snapshot or `NotFound`.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizSessionView>, AppError> {
    let collector = load_session(&state, id).await?;
    Ok(Json(QuizSessionView::new(id, &collector)))
}

/// POST /api/quiz/sessions/:id/answers
///
/// Records one step's answer and moves to the next step. On the last step the
/// session stays put; the client then calls `complete`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `id` - The session UUID.
/// * `answer` - The answer for one step.
///
/// # Returns
///
/// * `Result<Json<QuizSessionView>, AppError>` - The updated session, `NotFound` or `Conflict` once completed.
pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(answer): Json<StepAnswer>,
) -> Result<Json<QuizSessionView>, AppError> {
    let step = answer.step();

    let collector = update_session(&state, id, |collector| {
        collector.record(answer)?;
        if let Advance::Next(next) = collector.advance() {
            tracing::debug!("Session {} advanced to step {}", id, next.number());
        }
        Ok(())
    })
    .await
    .with_context(|| format!("recording {:?} for session {}", step, id))?;

    Ok(Json(QuizSessionView::new(id, &collector)))
}

/// POST /api/quiz/sessions/:id/back
///
/// Goes back one step. Completed sessions cannot be navigated.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `id` - The session UUID.
///
/// # Returns
///
/// * `Result<Json<QuizSessionView>, AppError>` - The updated session, `NotFound` or `Conflict` once completed.
pub async fn previous_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizSessionView>, AppError> {
    let collector = update_session(&state, id, |collector| {
        if collector.is_frozen() {
            return Err(AppError::Conflict(
                "Quiz already completed; answers are read-only".to_string(),
            ));
        }
        collector.back();
        Ok(())
    })
    .await?;

    Ok(Json(QuizSessionView::new(id, &collector)))
}

#[derive(Debug, Serialize)]
pub struct CompletedQuiz {
    pub id: Uuid,
    pub answers: QuizAnswers,
    pub quote: QuoteSummary,
}

/// POST /api/quiz/sessions/:id/complete
///
/// Freezes the answers and returns the quote. Completing twice returns the
/// same quote.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `id` - The session UUID.
///
/// # Returns
///
/// * `Result<Json<CompletedQuiz>, AppError>` - The frozen answers with their quote, or `NotFound`.
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletedQuiz>, AppError> {
    let collector = update_session(&state, id, |collector| {
        collector.finish();
        Ok(())
    })
    .await?;
    let answers = collector.answers().clone();

    let quote = QuoteSummary::from_answers(&answers);
    tracing::info!(
        "Quiz session {} completed: score={}, tier={}, cost={}",
        id,
        quote.score,
        quote.tier.level(),
        quote.formatted_cost
    );

    Ok(Json(CompletedQuiz { id, answers, quote }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (status, Json(body)) = health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_score_quiz_handler() {
        let answers: QuizAnswers = serde_json::from_value(json!({
            "chargerType": "Level 2 (240V home charger)"
        }))
        .unwrap();
        let Json(summary) = score_quiz(Json(answers)).await;
        assert_eq!(summary.installation_cost, 1200);
        assert_eq!(summary.formatted_cost, "$1,200");
    }
}
