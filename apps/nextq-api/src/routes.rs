use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use nextq_service::{Error as ServiceError, SuggestedQuestions, SuggestionView, TrendingQuestion};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/questions/suggested", get(suggested))
		.route("/v1/questions/refresh", post(refresh))
		.route("/v1/questions/records", get(records))
		.route("/v1/questions/trending", get(trending))
		.route("/v1/questions/executed", post(executed))
		.route("/v1/questions/cache", delete(clear_cache))
		.route("/v1/questions/{id}/click", post(click))
		.route("/v1/questions/{id}/dismiss", post(dismiss))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SuggestedParams {
	pub user_id: Uuid,
	pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
	pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
	pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
	pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ExecutedBody {
	pub user_id: Uuid,
	pub question: String,
	pub query_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
	pub success: bool,
	pub suggestion_id: Uuid,
	pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExecutedResponse {
	pub linked_suggestion_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
	pub suggestions: Vec<SuggestionView>,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
	pub questions: Vec<TrendingQuestion>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn suggested(
	State(state): State<AppState>,
	Query(params): Query<SuggestedParams>,
) -> Result<Json<SuggestedQuestions>, ApiError> {
	let limit = resolve_limit(&state, params.limit)?;

	Ok(Json(state.service.suggested(params.user_id, limit).await))
}

async fn refresh(
	State(state): State<AppState>,
	Query(params): Query<SuggestedParams>,
) -> Result<Json<SuggestedQuestions>, ApiError> {
	let limit = resolve_limit(&state, params.limit)?;

	tracing::info!(user_id = %params.user_id, "Refreshing suggested questions.");

	Ok(Json(state.service.refresh(params.user_id, limit).await))
}

async fn records(
	State(state): State<AppState>,
	Query(params): Query<UserParams>,
) -> Result<Json<RecordsResponse>, ApiError> {
	let suggestions = state.service.active_suggestions(params.user_id).await?;

	Ok(Json(RecordsResponse { suggestions }))
}

async fn trending(
	State(state): State<AppState>,
	Query(params): Query<TrendingParams>,
) -> Result<Json<TrendingResponse>, ApiError> {
	let department = params.department.as_deref().map(str::trim).filter(|d| !d.is_empty());
	let questions = state.service.trending_questions(department).await?;

	Ok(Json(TrendingResponse { questions }))
}

async fn executed(
	State(state): State<AppState>,
	Json(payload): Json<ExecutedBody>,
) -> Result<Json<ExecutedResponse>, ApiError> {
	let linked_suggestion_id = state
		.service
		.record_execution(payload.user_id, &payload.question, payload.query_id)
		.await?;

	Ok(Json(ExecutedResponse { linked_suggestion_id }))
}

async fn clear_cache(
	State(state): State<AppState>,
	Query(params): Query<UserParams>,
) -> StatusCode {
	state.service.clear_cache(params.user_id).await;

	StatusCode::NO_CONTENT
}

async fn click(
	State(state): State<AppState>,
	Path(suggestion_id): Path<Uuid>,
	Json(payload): Json<FeedbackBody>,
) -> Result<Json<FeedbackResponse>, ApiError> {
	state.service.record_click(payload.user_id, suggestion_id).await?;

	Ok(Json(FeedbackResponse {
		success: true,
		suggestion_id,
		message: "Click tracked.".to_string(),
	}))
}

async fn dismiss(
	State(state): State<AppState>,
	Path(suggestion_id): Path<Uuid>,
	Json(payload): Json<FeedbackBody>,
) -> Result<Json<FeedbackResponse>, ApiError> {
	state.service.record_dismiss(payload.user_id, suggestion_id).await?;

	Ok(Json(FeedbackResponse {
		success: true,
		suggestion_id,
		message: "Dismissal tracked.".to_string(),
	}))
}

fn resolve_limit(state: &AppState, raw: Option<i64>) -> Result<usize, ApiError> {
	let suggestions = &state.service.cfg().suggestions;
	let limit = raw.unwrap_or(i64::from(suggestions.default_limit));

	if limit < 1 || limit > i64::from(suggestions.max_limit) {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("limit must be between 1 and {}.", suggestions.max_limit),
			Some(vec!["$.limit".to_string()]),
		));
	}

	Ok(limit as usize)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "FORBIDDEN", message, None),
			err => {
				tracing::error!(error = %err, "Request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal error.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
