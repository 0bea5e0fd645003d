use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use sift_agent::{AgentError, AgenticRequest, AgenticResponse};
use sift_domain::intent::Intent;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/chat/agentic", post(agentic_chat))
		.route("/v1/intent", post(classify_intent))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn agentic_chat(
	State(state): State<AppState>,
	Json(payload): Json<AgenticRequest>,
) -> Result<Json<AgenticResponse>, ApiError> {
	let response = state.service.agentic_chat(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct IntentRequest {
	question: String,
	#[serde(default)]
	history: Vec<String>,
}

#[derive(Debug, Serialize)]
struct IntentResponse {
	intent: Intent,
}

async fn classify_intent(
	State(state): State<AppState>,
	Json(payload): Json<IntentRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
	let intent = state.service.classify_intent(&payload.question, &payload.history).await?;
	Ok(Json(IntentResponse { intent }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<AgentError> for ApiError {
	fn from(err: AgentError) -> Self {
		let (status, error_code) = match &err {
			AgentError::Validation { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			AgentError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_failed"),
			AgentError::Parse { .. } => (StatusCode::BAD_GATEWAY, "model_output_invalid"),
			AgentError::AllSubQuestionsFailed =>
				(StatusCode::BAD_GATEWAY, "all_sub_questions_failed"),
			AgentError::UnparsableCompletion { .. } =>
				(StatusCode::BAD_GATEWAY, "model_output_invalid"),
			AgentError::HybridPathsFailed => (StatusCode::BAD_GATEWAY, "hybrid_paths_failed"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
