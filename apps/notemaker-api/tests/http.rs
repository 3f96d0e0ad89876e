use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use notemaker_api::{routes, state::AppState};
use notemaker_service::{
	NoteService, Settings,
	memory::{MemoryNoteIndex, MemoryNoteStore},
};

struct Harness {
	app: Router,
	admin: Router,
	store: Arc<MemoryNoteStore>,
	index: Arc<MemoryNoteIndex>,
}

fn harness() -> Harness {
	let store = Arc::new(MemoryNoteStore::new());
	let index = Arc::new(MemoryNoteIndex::new());
	let service = NoteService::with_backends(Settings::default(), store.clone(), index.clone());
	let state = AppState::from_service(service);

	Harness {
		app: routes::router(state.clone()),
		admin: routes::admin_router(state),
		store,
		index,
	}
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
	let builder = Request::builder().method(method).uri(uri);
	let request = match body {
		Some(body) => builder
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.expect("Failed to build request."),
		None => builder.body(Body::empty()).expect("Failed to build request."),
	};

	app.clone().oneshot(request).await.expect("Failed to call router.")
}

async fn json_body(response: Response) -> Value {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body.");

	serde_json::from_slice(&bytes).expect("Failed to parse body.")
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
	response.headers().get(name).and_then(|value| value.to_str().ok())
}

async fn create(app: &Router, text: &str) -> i64 {
	let response = send(app, "POST", "/api/notes", Some(json!({ "text": text }))).await;

	assert_eq!(response.status(), StatusCode::CREATED);

	json_body(response).await["id"].as_i64().expect("Created note must carry an id.")
}

#[tokio::test]
async fn health_is_ok() {
	let harness = harness();
	let response = send(&harness.app, "GET", "/health", None).await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_returns_location_and_alert_headers() {
	let harness = harness();
	let response = send(&harness.app, "POST", "/api/notes", Some(json!({ "text": "A" }))).await;

	assert_eq!(response.status(), StatusCode::CREATED);
	assert_eq!(header_str(&response, "location"), Some("/api/notes/1"));
	assert_eq!(header_str(&response, "x-notemaker-alert"), Some("notemaker.note.created"));
	assert_eq!(header_str(&response, "x-notemaker-params"), Some("1"));
	assert_eq!(header_str(&response, "x-notemaker-index"), None);

	let body = json_body(response).await;

	assert_eq!(body, json!({ "id": 1, "text": "A" }));
	assert_eq!(harness.index.len(), 1);
}

#[tokio::test]
async fn create_with_id_is_rejected_without_writing() {
	let harness = harness();
	let response =
		send(&harness.app, "POST", "/api/notes", Some(json!({ "id": 5, "text": "A" }))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["error_code"], "invalid_state");
	assert!(harness.store.is_empty());
	assert!(harness.index.is_empty());
}

#[tokio::test]
async fn put_without_id_creates_and_with_id_updates() {
	let harness = harness();
	let created = send(&harness.app, "PUT", "/api/notes", Some(json!({ "text": "A" }))).await;

	assert_eq!(created.status(), StatusCode::CREATED);

	let id = json_body(created).await["id"].as_i64().expect("Created note must carry an id.");
	let updated =
		send(&harness.app, "PUT", "/api/notes", Some(json!({ "id": id, "text": "B" }))).await;

	assert_eq!(updated.status(), StatusCode::OK);
	assert_eq!(header_str(&updated, "x-notemaker-alert"), Some("notemaker.note.updated"));
	assert_eq!(json_body(updated).await["text"], "B");

	let fetched = send(&harness.app, "GET", &format!("/api/notes/{id}"), None).await;

	assert_eq!(json_body(fetched).await, json!({ "id": id, "text": "B" }));
}

#[tokio::test]
async fn missing_note_is_not_found() {
	let harness = harness();
	let response = send(&harness.app, "GET", "/api/notes/42", None).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(json_body(response).await["error_code"], "not_found");
}

#[tokio::test]
async fn list_sets_total_count_and_links() {
	let harness = harness();

	for text in ["c", "a", "b"] {
		create(&harness.app, text).await;
	}

	let response = send(&harness.app, "GET", "/api/notes?page=0&size=2&sort=text,asc", None).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(header_str(&response, "x-total-count"), Some("3"));

	let link = header_str(&response, "link").expect("Missing Link header.").to_string();

	assert!(link.contains("</api/notes?page=1&size=2&sort=text,asc>; rel=\"next\""));
	assert!(link.contains("rel=\"last\""));
	assert!(!link.contains("rel=\"prev\""));

	let body = json_body(response).await;
	let texts = body
		.as_array()
		.expect("List body must be an array.")
		.iter()
		.map(|note| note["text"].as_str().unwrap_or_default().to_string())
		.collect::<Vec<_>>();

	assert_eq!(texts, vec!["a", "b"]);
}

#[tokio::test]
async fn list_rejects_unknown_sort_and_zero_size() {
	let harness = harness();
	let bad_sort = send(&harness.app, "GET", "/api/notes?sort=title,asc", None).await;

	assert_eq!(bad_sort.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(bad_sort).await["error_code"], "invalid_request");

	let zero = send(&harness.app, "GET", "/api/notes?size=0", None).await;

	assert_eq!(zero.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_reads_the_index() {
	let harness = harness();
	let id = create(&harness.app, "alpha beta").await;

	create(&harness.app, "gamma").await;

	let response = send(&harness.app, "GET", &format!("/api/_search/notes?query=id:{id}"), None).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(header_str(&response, "x-total-count"), Some("1"));
	assert_eq!(json_body(response).await, json!([{ "id": id, "text": "alpha beta" }]));

	let by_text = send(&harness.app, "GET", "/api/_search/notes?query=gamma", None).await;

	assert_eq!(header_str(&by_text, "x-total-count"), Some("1"));
}

#[tokio::test]
async fn malformed_search_is_invalid_query() {
	let harness = harness();
	let response = send(&harness.app, "GET", "/api/_search/notes?query=id:abc", None).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["error_code"], "invalid_query");
}

#[tokio::test]
async fn index_outage_keeps_the_write_and_flags_it() {
	let harness = harness();

	harness.index.set_offline(true);

	let response = send(&harness.app, "POST", "/api/notes", Some(json!({ "text": "A" }))).await;

	assert_eq!(response.status(), StatusCode::CREATED);
	assert_eq!(header_str(&response, "x-notemaker-index"), Some("stale"));
	assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn primary_outage_is_service_unavailable() {
	let harness = harness();

	harness.store.set_offline(true);

	let response = send(&harness.app, "POST", "/api/notes", Some(json!({ "text": "A" }))).await;

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json_body(response).await["error_code"], "store_unavailable");
	assert!(harness.index.is_empty());
}

#[tokio::test]
async fn delete_removes_from_both_stores() {
	let harness = harness();
	let id = create(&harness.app, "A").await;
	let response = send(&harness.app, "DELETE", &format!("/api/notes/{id}"), None).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(header_str(&response, "x-notemaker-alert"), Some("notemaker.note.deleted"));
	assert!(harness.store.is_empty());
	assert!(harness.index.is_empty());

	let again = send(&harness.app, "DELETE", &format!("/api/notes/{id}"), None).await;

	assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_of_negative_id_is_a_client_error() {
	let harness = harness();
	let response = send(&harness.app, "DELETE", "/api/notes/-5", None).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(header_str(&response, "x-notemaker-index"), None);
	assert_eq!(json_body(response).await["error_code"], "invalid_request");
}

#[tokio::test]
async fn text_with_nul_is_a_client_error() {
	let harness = harness();
	let response =
		send(&harness.app, "POST", "/api/notes", Some(json!({ "text": "a\u{0}b" }))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(harness.store.is_empty());
}

#[tokio::test]
async fn admin_reindex_rebuilds_the_index() {
	let harness = harness();

	harness.index.set_offline(true);
	create(&harness.app, "A").await;
	create(&harness.app, "B").await;
	harness.index.set_offline(false);

	assert!(harness.index.is_empty());

	let response = send(&harness.admin, "POST", "/admin/reindex", None).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "indexed_count": 2, "error_count": 0 }));
	assert_eq!(harness.index.len(), 2);
}

#[tokio::test]
async fn admin_routes_are_not_on_the_public_router() {
	let harness = harness();
	let response = send(&harness.app, "POST", "/admin/reindex", None).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
