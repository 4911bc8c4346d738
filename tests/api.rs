use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};
use todocrud::todo::{NewTodo, TodoChanges};
use todocrud::{
    MemoryStore, Response, Router, StatusCode, StoreError, Todo, TodoId, TodoStore, api,
};

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (api::routes(store.clone()), store)
}

fn request(method: &str, uri: &str, body: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_owned()))
        .unwrap()
}

fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

async fn create(app: &Router, title: &str, subtitle: &str) -> Todo {
    let body = json!({ "title": title, "subtitle": subtitle }).to_string();
    let res = app.handle(request("POST", "/create", &body)).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    serde_json::from_value(body_json(&res)["todo"].clone()).unwrap()
}

// --- create ---

#[tokio::test]
async fn create_returns_wrapped_record() {
    let (app, store) = app();
    let res = app
        .handle(request("POST", "/create", r#"{"title":"Buy milk","subtitle":"2%"}"#))
        .await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let body = body_json(&res);
    let todo = &body["todo"];
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["subtitle"], "2%");
    assert_eq!(todo["createdAt"], todo["updatedAt"]);
    let id: TodoId = todo["_id"].as_str().unwrap().parse().unwrap();
    assert!(store.find_by_id(id).await.unwrap().is_some());
}

#[tokio::test]
async fn create_with_taken_title_is_rejected() {
    let (app, store) = app();
    create(&app, "Buy milk", "2%").await;

    let res = app
        .handle(request("POST", "/create", r#"{"title":"Buy milk","subtitle":"whole"}"#))
        .await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&res), json!({ "error": "Todo with this title already exists" }));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn create_with_invalid_json_is_rejected() {
    let (app, store) = app();
    let res = app.handle(request("POST", "/create", "{title:")).await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&res), json!({ "error": "Invalid JSON body" }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn create_without_subtitle_stores_empty_subtitle() {
    let (app, _) = app();
    let res = app.handle(request("POST", "/create", r#"{"title":"No subtitle"}"#)).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(body_json(&res)["todo"]["subtitle"], "");
}

// --- get ---

#[tokio::test]
async fn get_returns_stored_record_verbatim() {
    let (app, _) = app();
    let created = create(&app, "Read", "a book").await;

    let res = app.handle(request("GET", &format!("/{}", created.id), "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let fetched: Todo = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let (app, _) = app();
    let res = app.handle(request("GET", &format!("/{}", TodoId::new()), "")).await;

    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&res), json!({ "error": "Todo not found" }));
}

#[tokio::test]
async fn get_malformed_id_is_server_error() {
    let (app, _) = app();
    let res = app.handle(request("GET", "/not-an-object-id", "")).await;

    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(&res), json!({ "error": "Failed to get todo" }));
}

// --- update ---

#[tokio::test]
async fn update_changes_fields_and_refreshes_updated_at() {
    let (app, _) = app();
    let created = create(&app, "Buy milk", "2%").await;

    let res = app
        .handle(request(
            "PUT",
            &format!("/{}", created.id),
            r#"{"title":"Buy oat milk","subtitle":"barista"}"#,
        ))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let updated: Todo = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Buy oat milk");
    assert_eq!(updated.subtitle, "barista");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn back_to_back_updates_keep_advancing_updated_at() {
    let (app, _) = app();
    let created = create(&app, "Buy milk", "2%").await;
    let path = format!("/{}", created.id);

    let mut last = created.updated_at;
    for i in 0..50 {
        let body = json!({ "subtitle": format!("rev {i}") }).to_string();
        let res = app.handle(request("PUT", &path, &body)).await;
        let updated: Todo = serde_json::from_slice(res.body()).unwrap();

        assert!(updated.updated_at > last, "update {i}");
        last = updated.updated_at;
    }
}

#[tokio::test]
async fn update_leaves_omitted_fields_alone() {
    let (app, _) = app();
    let created = create(&app, "Buy milk", "2%").await;

    let res = app
        .handle(request("PUT", &format!("/{}", created.id), r#"{"subtitle":"skim"}"#))
        .await;

    let updated: Todo = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(updated.title, "Buy milk");
    assert_eq!(updated.subtitle, "skim");
}

#[tokio::test]
async fn update_unknown_id_is_not_found_and_creates_nothing() {
    let (app, store) = app();
    let res = app
        .handle(request("PUT", &format!("/{}", TodoId::new()), r#"{"title":"x"}"#))
        .await;

    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&res), json!({ "error": "Todo not found" }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn update_to_another_records_title_is_rejected() {
    let (app, store) = app();
    create(&app, "first", "").await;
    let second = create(&app, "second", "").await;

    let res = app
        .handle(request("PUT", &format!("/{}", second.id), r#"{"title":"first"}"#))
        .await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let unchanged = store.find_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(unchanged, second);
}

// --- delete ---

#[tokio::test]
async fn delete_removes_record() {
    let (app, _) = app();
    let created = create(&app, "Throw away", "").await;
    let path = format!("/{}", created.id);

    let res = app.handle(request("DELETE", &path, "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(body_json(&res), json!({ "message": "Deleted successfully" }));

    let res = app.handle(request("GET", &path, "")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let (app, _) = app();
    let res = app.handle(request("DELETE", &format!("/{}", TodoId::new()), "")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_title_can_be_reused() {
    let (app, _) = app();
    let created = create(&app, "again", "").await;
    app.handle(request("DELETE", &format!("/{}", created.id), "")).await;

    let recreated = create(&app, "again", "").await;
    assert_ne!(recreated.id, created.id);
}

// --- routing and health ---

#[tokio::test]
async fn health_probes_answer() {
    let (app, _) = app();

    let res = app.handle(request("GET", "/healthz", "")).await;
    assert_eq!(res.body(), b"ok");

    let res = app.handle(request("GET", "/readyz", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), b"ready");
}

#[tokio::test]
async fn unsupported_method_on_todo_path_is_405() {
    let (app, _) = app();
    let res = app.handle(request("PATCH", &format!("/{}", TodoId::new()), "")).await;

    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "DELETE, GET, PUT");
}

// --- store failures ---

/// A store whose every operation fails, as MongoDB does when unreachable.
struct DownStore;

fn down() -> StoreError {
    StoreError::Mongo(mongodb::error::Error::custom("connection refused"))
}

#[async_trait]
impl TodoStore for DownStore {
    async fn find_by_title(&self, _: &str) -> Result<Option<Todo>, StoreError> { Err(down()) }
    async fn find_by_id(&self, _: TodoId) -> Result<Option<Todo>, StoreError> { Err(down()) }
    async fn insert(&self, _: NewTodo) -> Result<Todo, StoreError> { Err(down()) }
    async fn update_by_id(&self, _: TodoId, _: TodoChanges) -> Result<Option<Todo>, StoreError> {
        Err(down())
    }
    async fn delete_by_id(&self, _: TodoId) -> Result<Option<Todo>, StoreError> { Err(down()) }
    async fn ping(&self) -> Result<(), StoreError> { Err(down()) }
}

#[tokio::test]
async fn store_failures_become_generic_server_errors() {
    let app = api::routes(Arc::new(DownStore));
    let id = TodoId::new();

    let cases = [
        ("POST", "/create".to_owned(), r#"{"title":"t"}"#, "Failed to create todo"),
        ("GET", format!("/{id}"), "", "Failed to get todo"),
        ("PUT", format!("/{id}"), r#"{"title":"t"}"#, "Failed to update todo"),
        ("DELETE", format!("/{id}"), "", "Failed to delete todo"),
    ];

    for (method, path, body, message) in cases {
        let res = app.handle(request(method, &path, body)).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {path}");
        assert_eq!(body_json(&res), json!({ "error": message }));
    }
}

#[tokio::test]
async fn readiness_fails_when_store_is_down() {
    let app = api::routes(Arc::new(DownStore));
    let res = app.handle(request("GET", "/readyz", "")).await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
