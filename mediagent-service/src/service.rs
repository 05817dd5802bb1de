use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use mediagent_core::{
    ConsultationRunner, FlowError, InMemorySessionStorage, InteractiveAdvisor, IntakeForm,
    PrecautionGenerator, TransitionError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::ServiceConfig,
    models::{ChatRequest, ChatResponse, NarrationResponse, PrecautionsResponse, SessionResponse},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// Map a flow failure onto the response the form shows for it.
fn flow_error(session_id: &str, err: FlowError) -> ApiError {
    match err {
        FlowError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Validation failed",
                "fieldErrors": validation.errors
            })),
        ),
        FlowError::Generation(e) => {
            error!(session_id = %session_id, "Generation failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": e.to_string(),
                    "session_id": session_id
                })),
            )
        }
        FlowError::Catalog(e) => internal_error("Failed to load doctor types.", &e.to_string()),
        FlowError::Transition(e) => conflict_error(&e.to_string()),
        FlowError::SessionNotFound(id) => not_found_error("Session not found", &id),
        FlowError::Storage(details) => {
            error!(session_id = %session_id, "Storage failure: {}", details);
            internal_error("Session storage failure", &details)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runner: ConsultationRunner,
}

pub fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let app_state = create_app_state(config)?;
    Ok(build_router(app_state))
}

fn create_app_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let backend = Arc::new(config.backend()?);
    let catalog = Arc::new(config.catalog()?);
    info!(model = %backend.model(), "Generation backend configured");

    let runner = ConsultationRunner::new(
        PrecautionGenerator::new(backend.clone()),
        InteractiveAdvisor::new(backend),
        catalog,
        Arc::new(InMemorySessionStorage::new()),
    );

    Ok(AppState { runner })
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/doctor-types", get(list_doctor_types))
        .route("/consultations", post(open_consultation))
        .route(
            "/consultations/{session_id}",
            get(get_consultation).delete(close_consultation),
        )
        .route(
            "/consultations/{session_id}/precautions",
            post(submit_precautions),
        )
        .route("/consultations/{session_id}/chat", post(ask_question))
        .route("/consultations/{session_id}/narration", get(get_narration))
        .route("/consultations/{session_id}/error", delete(dismiss_error))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "MediAgent Pre-Consultation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personalized precautions before a doctor consultation, with follow-up questions",
        "endpoints": {
            "GET /doctor-types": "List selectable doctor types",
            "POST /consultations": "Open a consultation session",
            "GET /consultations/{session_id}": "Get session state",
            "DELETE /consultations/{session_id}": "Discard a session",
            "POST /consultations/{session_id}/precautions": "Submit symptoms and doctor type",
            "POST /consultations/{session_id}/chat": "Ask a follow-up question",
            "GET /consultations/{session_id}/narration": "Text for reading the precautions aloud",
            "DELETE /consultations/{session_id}/error": "Dismiss the error banner",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_doctor_types(State(state): State<AppState>) -> ApiResult<Value> {
    match state.runner.catalog().doctor_types().await {
        Ok(doctor_types) => Ok(Json(json!({ "doctorTypes": doctor_types }))),
        Err(e) => {
            error!("Failed to load doctor types: {}", e);
            Err(internal_error("Failed to load doctor types.", &e.to_string()))
        }
    }
}

async fn open_consultation(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .runner
        .open()
        .await
        .map_err(|e| flow_error("new", e))?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_consultation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = state
        .runner
        .session(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    Ok(Json(session.into()))
}

async fn close_consultation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .runner
        .close(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn submit_precautions(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(form): Json<IntakeForm>,
) -> ApiResult<PrecautionsResponse> {
    info!(session_id = %session_id, "Precautions requested");

    let precautions = state
        .runner
        .submit(&session_id, form)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    Ok(Json(PrecautionsResponse {
        session_id,
        precautions,
    }))
}

async fn ask_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let answer = state
        .runner
        .ask(&session_id, &request.question)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    Ok(Json(ChatResponse {
        session_id,
        question: request.question.trim().to_string(),
        answer: answer.response_text,
    }))
}

async fn get_narration(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<NarrationResponse> {
    let session = state
        .runner
        .session(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    match session.state.precautions {
        Some(precautions) => Ok(Json(NarrationResponse {
            session_id,
            narration: precautions.narration(),
        })),
        None => {
            warn!(session_id = %session_id, "Narration requested before precautions");
            Err(flow_error(
                &session_id,
                FlowError::Transition(TransitionError::NoPrecautions),
            ))
        }
    }
}

async fn dismiss_error(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = state
        .runner
        .dismiss_error(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    Ok(Json(session.into()))
}
