//! API routes for furliefd

use crate::context::request_context;
use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use furlief_common::dashboard::{
    compute_stats, export_csv, export_filename, filter_signups, DashboardStats, SignupPage,
    SignupQuery, StatusFilter,
};
use furlief_common::{QuizSubmission, SqliteStore, WaitlistService, WaitlistStore};
use furlief_shared::events::AnalyticsEvent;
use furlief_shared::quiz::{evaluate, questions, Question, QuizAnswers, QuizResult, SeverityTier};
use furlief_shared::signup::{
    Signup, SignupFailure, SignupOutcome, SignupRequest, SignupResponse, DOG_BREEDS,
};
use furlief_shared::symptoms::{assess_symptoms, parse_selection, Symptom, SymptomAssessment, CATALOG};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

type AppStateArc = Arc<AppState>;

/// Run store-bound service work on the blocking pool. rusqlite calls hold
/// the connection mutex and must stay off the async workers.
async fn with_service<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(WaitlistService<SqliteStore>) -> T + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    Ok(tokio::task::spawn_blocking(move || work(service)).await?)
}

async fn all_signups(state: &AppState) -> Result<Vec<Signup>, ApiError> {
    Ok(with_service(state, |service| service.store().list_signups()).await??)
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Quiz Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub answers: QuizAnswers,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub severity_level: SeverityTier,
    pub result: QuizResult,
}

pub fn quiz_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/quiz/questions", get(list_questions))
        .route("/api/quiz/classify", post(classify))
        .route("/api/quiz/complete", post(complete_quiz))
}

async fn list_questions() -> Json<Vec<Question>> {
    Json(questions())
}

/// Live evaluation; records nothing
async fn classify(Json(req): Json<QuizRequest>) -> Json<ClassifyResponse> {
    let (severity_level, result) = evaluate(&req.answers);
    Json(ClassifyResponse {
        severity_level,
        result,
    })
}

async fn complete_quiz(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizSubmission>, ApiError> {
    let ctx = request_context(&headers);
    let answered = req.answers.answered();
    let submission =
        with_service(&state, move |service| service.submit_quiz(&ctx, &req.answers)).await?;
    state.metrics.record_quiz(submission.severity_level.as_str());
    info!(
        "Quiz completed: {} ({} of 5 answered)",
        submission.severity_level, answered
    );
    Ok(Json(submission))
}

// ============================================================================
// Symptom Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    #[serde(default)]
    pub selected: Vec<String>,
}

pub fn symptom_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/symptoms", get(list_symptoms))
        .route("/api/symptoms/assess", post(assess))
}

async fn list_symptoms() -> Json<Vec<Symptom>> {
    Json(CATALOG.to_vec())
}

async fn assess(
    State(state): State<AppStateArc>,
    Json(req): Json<AssessRequest>,
) -> Json<SymptomAssessment> {
    let selected = parse_selection(&req.selected);
    let assessment = assess_symptoms(&selected);
    state.metrics.record_assessment(assessment.tier.as_str());
    Json(assessment)
}

// ============================================================================
// Waitlist Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct WaitlistStats {
    pub total_signups: u64,
}

pub fn waitlist_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/waitlist", post(join_waitlist))
        .route("/api/waitlist/stats", get(waitlist_stats))
        .route("/api/breeds", get(list_breeds))
}

fn outcome_label(outcome: &SignupOutcome) -> &'static str {
    match outcome {
        SignupOutcome::Joined(_) => "joined",
        SignupOutcome::AlreadyRegistered(_) => "existing",
        SignupOutcome::Failed { failure, .. } => match failure {
            SignupFailure::InvalidEmail => "invalid_email",
            SignupFailure::AlreadyRegistered => "conflict",
            SignupFailure::Network => "network",
            SignupFailure::Permission => "permission",
            SignupFailure::Generic => "error",
        },
    }
}

fn outcome_status(outcome: &SignupOutcome) -> StatusCode {
    match outcome {
        SignupOutcome::Joined(_) => StatusCode::CREATED,
        SignupOutcome::AlreadyRegistered(_) => StatusCode::OK,
        SignupOutcome::Failed { failure, .. } => match failure {
            SignupFailure::InvalidEmail => StatusCode::BAD_REQUEST,
            SignupFailure::AlreadyRegistered => StatusCode::CONFLICT,
            SignupFailure::Network => StatusCode::SERVICE_UNAVAILABLE,
            SignupFailure::Permission => StatusCode::FORBIDDEN,
            SignupFailure::Generic => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

async fn join_waitlist(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> (StatusCode, Json<SignupResponse>) {
    let origin = &state.config.server.public_origin;
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!("Unreadable signup body: {}", rejection.body_text());
            state.metrics.record_signup("malformed");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            let outcome = SignupOutcome::Failed {
                failure: SignupFailure::Generic,
                detail: rejection.body_text(),
            };
            return (status, Json(outcome.into_response(origin)));
        }
    };

    let ctx = request_context(&headers);
    let outcome = with_service(&state, move |service| service.submit_signup(&ctx, &req))
        .await
        .unwrap_or_else(|e| SignupOutcome::Failed {
            failure: SignupFailure::Generic,
            detail: e.to_string(),
        });

    state.metrics.record_signup(outcome_label(&outcome));
    let status = outcome_status(&outcome);
    (status, Json(outcome.into_response(origin)))
}

async fn waitlist_stats(State(state): State<AppStateArc>) -> Result<Json<WaitlistStats>, ApiError> {
    let total_signups = with_service(&state, |service| service.waitlist_total()).await?;
    Ok(Json(WaitlistStats { total_signups }))
}

async fn list_breeds() -> Json<Vec<&'static str>> {
    Json(DOG_BREEDS.to_vec())
}

// ============================================================================
// Event Routes
// ============================================================================

pub fn event_routes() -> Router<AppStateArc> {
    Router::new().route("/api/events", post(track_event))
}

async fn track_event(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(event): Json<AnalyticsEvent>,
) -> Result<StatusCode, ApiError> {
    if !event.is_client_reportable() {
        return Err(ApiError::BadRequest(format!(
            "{} events are recorded by the server",
            event.event_type()
        )));
    }

    let ctx = request_context(&headers);
    let event_type = event.event_type();
    debug!("Tracking {} for {}", event_type, ctx.session_id);
    with_service(&state, move |service| service.track(&ctx, &event)).await?;
    state.metrics.record_event(event_type);
    Ok(StatusCode::ACCEPTED)
}

// ============================================================================
// Metrics Routes
// ============================================================================

pub fn metrics_routes() -> Router<AppStateArc> {
    Router::new().route("/metrics", get(export_metrics))
}

async fn export_metrics(State(state): State<AppStateArc>) -> Result<Response, ApiError> {
    let body = state.metrics.export()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

// ============================================================================
// Admin Routes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SignupListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

impl SignupListParams {
    fn into_query(self) -> Result<SignupQuery, ApiError> {
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<StatusFilter>().map_err(ApiError::BadRequest)?,
            None => StatusFilter::All,
        };
        Ok(SignupQuery {
            search: self.search,
            status,
            page: self.page.unwrap_or(1),
        })
    }
}

pub fn admin_routes(state: AppStateArc) -> Router<AppStateArc> {
    Router::new()
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/signups", get(admin_signups))
        .route("/api/admin/export", get(admin_export))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

async fn admin_stats(State(state): State<AppStateArc>) -> Result<Json<DashboardStats>, ApiError> {
    let signups = all_signups(&state).await?;
    Ok(Json(compute_stats(&signups, Utc::now())))
}

async fn admin_signups(
    State(state): State<AppStateArc>,
    Query(params): Query<SignupListParams>,
) -> Result<Json<SignupPage>, ApiError> {
    let query = params.into_query()?;
    let signups = all_signups(&state).await?;
    Ok(Json(filter_signups(
        &signups,
        &query,
        state.config.waitlist.page_size,
    )))
}

async fn admin_export(State(state): State<AppStateArc>) -> Result<Response, ApiError> {
    let signups = all_signups(&state).await?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(Utc::now()));
    info!("Exporting {} signups", signups.len());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export_csv(&signups),
    )
        .into_response())
}
