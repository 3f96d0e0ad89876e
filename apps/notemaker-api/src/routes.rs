use axum::{
	Json, Router,
	extract::{OriginalUri, Path, Query, State},
	http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use notemaker_domain::{NoteDto, NoteId, Page, Sort, transcoder};
use notemaker_service::{Error, IndexSync, ReindexReport, Saved};

pub const NOTES_PATH: &str = "/api/notes";
pub const SEARCH_PATH: &str = "/api/_search/notes";

pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");
pub const X_ALERT: HeaderName = HeaderName::from_static("x-notemaker-alert");
pub const X_PARAMS: HeaderName = HeaderName::from_static("x-notemaker-params");
/// Set to `stale` when the primary write committed but the search index did not follow.
pub const X_INDEX: HeaderName = HeaderName::from_static("x-notemaker-index");

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route(NOTES_PATH, post(create_note).put(update_note).get(list_notes))
		.route("/api/notes/{id}", get(get_note).delete(delete_note))
		.route(SEARCH_PATH, get(search_notes))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/admin/reindex", post(reindex)).with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListParams {
	page: Option<u32>,
	size: Option<u32>,
	sort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
	#[serde(default)]
	query: String,
	page: Option<u32>,
	size: Option<u32>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_note(
	State(state): State<AppState>,
	Json(payload): Json<NoteDto>,
) -> Result<Response, ApiError> {
	if payload.id.is_some() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"invalid_state",
			"A new note cannot already have an id.",
		));
	}

	let saved = state.service.save(transcoder::to_entity(payload)).await?;

	created(saved)
}

async fn update_note(
	State(state): State<AppState>,
	Json(payload): Json<NoteDto>,
) -> Result<Response, ApiError> {
	let saved = state.service.save(transcoder::to_entity(payload)).await?;

	if saved.created {
		return created(saved);
	}

	let id = saved_id(&saved)?;
	let headers = write_headers("note.updated", id, &saved.index)?;

	Ok((StatusCode::OK, headers, Json(transcoder::to_dto(saved.note))).into_response())
}

async fn get_note(
	State(state): State<AppState>,
	Path(id): Path<NoteId>,
) -> Result<Json<NoteDto>, ApiError> {
	let note = state.service.get(id).await?;

	Ok(Json(transcoder::to_dto(note)))
}

async fn list_notes(
	State(state): State<AppState>,
	OriginalUri(uri): OriginalUri,
	Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
	let request = state.service.page_request(params.page, params.size)?;
	let sort = match params.sort.as_deref() {
		Some(raw) => raw.parse::<Sort>().map_err(Error::from)?,
		None => Sort::default(),
	};
	let page = state.service.list(request, sort).await?;

	page_response(NOTES_PATH, uri.query(), page.map(transcoder::to_dto))
}

async fn search_notes(
	State(state): State<AppState>,
	OriginalUri(uri): OriginalUri,
	Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
	let request = state.service.page_request(params.page, params.size)?;
	let page = state.service.search(&params.query, request).await.map_err(|err| match err {
		Error::InvalidRequest { message } =>
			json_error(StatusCode::BAD_REQUEST, "invalid_query", message),
		other => ApiError::from(other),
	})?;

	page_response(SEARCH_PATH, uri.query(), page.map(transcoder::to_dto))
}

async fn delete_note(
	State(state): State<AppState>,
	Path(id): Path<NoteId>,
) -> Result<Response, ApiError> {
	let deleted = state.service.delete(id).await?;
	let headers = write_headers("note.deleted", deleted.id, &deleted.index)?;

	Ok((StatusCode::OK, headers).into_response())
}

async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
	let report = state.service.reindex().await?;

	Ok(Json(report))
}

fn created(saved: Saved) -> Result<Response, ApiError> {
	let id = saved_id(&saved)?;
	let mut headers = write_headers("note.created", id, &saved.index)?;

	headers.insert(header::LOCATION, header_value(format!("{NOTES_PATH}/{id}"))?);

	Ok((StatusCode::CREATED, headers, Json(transcoder::to_dto(saved.note))).into_response())
}

fn saved_id(saved: &Saved) -> Result<NoteId, ApiError> {
	saved.note.id.ok_or_else(|| {
		json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Saved note has no id.")
	})
}

fn write_headers(alert: &str, id: NoteId, index: &IndexSync) -> Result<HeaderMap, ApiError> {
	let mut headers = HeaderMap::new();

	headers.insert(X_ALERT, header_value(format!("notemaker.{alert}"))?);
	headers.insert(X_PARAMS, header_value(id.to_string())?);

	if index.is_stale() {
		headers.insert(X_INDEX, HeaderValue::from_static("stale"));
	}

	Ok(headers)
}

fn page_response<T>(path: &str, query: Option<&str>, page: Page<T>) -> Result<Response, ApiError>
where
	T: Serialize,
{
	let mut headers = HeaderMap::new();

	headers.insert(X_TOTAL_COUNT, header_value(page.total.to_string())?);
	headers.insert(header::LINK, header_value(link_header(path, query, &page))?);

	Ok((StatusCode::OK, headers, Json(page.items)).into_response())
}

/// RFC 5988 pagination links. Query parameters other than `page` and `size` are carried over.
pub fn link_header<T>(path: &str, query: Option<&str>, page: &Page<T>) -> String {
	let carried = query
		.unwrap_or_default()
		.split('&')
		.filter(|pair| !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("size="))
		.collect::<Vec<_>>()
		.join("&");
	let link = |number: u64, rel: &str| {
		let mut target = format!("{path}?page={number}&size={}", page.size);

		if !carried.is_empty() {
			target.push('&');
			target.push_str(&carried);
		}

		format!("<{target}>; rel=\"{rel}\"")
	};
	let current = u64::from(page.page);
	let mut links = Vec::with_capacity(4);

	if page.has_next() {
		links.push(link(current + 1, "next"));
	}
	if page.has_prev() {
		links.push(link(current - 1, "prev"));
	}

	links.push(link(page.total_pages().saturating_sub(1), "last"));
	links.push(link(0, "first"));

	links.join(",")
}

fn header_value(value: String) -> Result<HeaderValue, ApiError> {
	HeaderValue::try_from(value).map_err(|err| {
		json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", format!("Bad header: {err}."))
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "not_found", message),
			Error::InvalidState { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_state", message),
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			err @ Error::StoreUnavailable { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", err.to_string()),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				status = %self.status,
				error_code = %self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
