//! PostgREST Transport Contract Tests
//!
//! These tests pin the exact HTTP shape of table calls against a mock backend:
//! - paths, query filters and the `select=*` projection
//! - `apikey`, `Authorization` and `Prefer` headers
//! - mapping of error bodies into `RemoteError`
//! - the cache sitting in front of the transport

use serde_json::json;
use std::sync::Arc;
use taskboard_shared::models::task::{NewTask, TaskChanges};
use taskboard_shared::models::Table;
use taskboard_shared::remote::{PostgrestStore, ProjectConfig, RowFilter, TableStore};
use taskboard_shared::{DataError, Database};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "anon-key";

fn store_for(server: &MockServer) -> PostgrestStore {
    PostgrestStore::new(ProjectConfig::new(server.uri(), API_KEY))
}

fn task_row(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "created_at": "2024-05-01T12:00:00+00:00",
        "user_id": "6f1c2a52-1d1e-4d7b-9a55-0c6b1f5f2d11",
        "task_name": name,
        "task_description": null
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Request Format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_uses_project_key_without_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("select", "*"))
        .and(header("apikey", API_KEY))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_row(1, "a")])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .select_all(Table::Tasks, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_select_forwards_user_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_data"))
        .and(header("apikey", API_KEY))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .select_all(Table::UserData, Some("user-token"))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_insert_wraps_row_and_asks_for_representation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{ "task_name": "write docs" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([task_row(3, "write docs")])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .insert(Table::Tasks, json!({ "task_name": "write docs" }), None)
        .await
        .unwrap();
    assert_eq!(rows[0]["id"], 3);
}

#[tokio::test]
async fn test_update_and_delete_filter_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.7"))
        .and(body_json(json!({ "task_name": "renamed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_row(7, "renamed")])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let updated = store
        .update(Table::Tasks, RowFilter::id(7), json!({ "task_name": "renamed" }), None)
        .await
        .unwrap();
    assert_eq!(updated[0]["task_name"], "renamed");

    let removed = store.delete(Table::Tasks, RowFilter::id(7), None).await.unwrap();
    assert!(removed.is_empty());
}

#[tokio::test]
async fn test_owner_scoped_writes_filter_by_user() {
    let server = MockServer::start().await;
    let owner = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.7"))
        .and(query_param("user_id", format!("eq.{}", owner)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::new(Arc::new(store_for(&server))).with_owner(owner);
    let err = db
        .tasks()
        .update(7, &TaskChanges::rename("renamed"))
        .await
        .unwrap_err();

    assert_eq!(err.as_remote().and_then(|e| e.status), Some(404));
}

#[tokio::test]
async fn test_insert_without_representation_still_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::new(Arc::new(store_for(&server)));
    let created = db
        .tasks()
        .create(&NewTask::new(Uuid::new_v4(), "new", ""))
        .await
        .unwrap();

    assert!(created.is_none());
}

// ────────────────────────────────────────────────────────────────────────────
// Error Mapping
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_constraint_violation_keeps_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"tasks_pkey\"",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .insert(Table::Tasks, json!({ "task_name": "x" }), None)
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(409));
    assert_eq!(err.code.as_deref(), Some("23505"));
    assert!(err.message.starts_with("duplicate key value"));
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .select_all(Table::Tasks, Some("stale"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "JWT expired");
}

#[tokio::test]
async fn test_unreachable_backend() {
    let store = PostgrestStore::new(ProjectConfig::new("http://127.0.0.1:1", API_KEY));

    let err = store.select_all(Table::Tasks, None).await.unwrap_err();
    assert_eq!(err.status, None);
    assert!(!err.message.is_empty());
}

#[tokio::test]
async fn test_ping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .and(header("apikey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(store_for(&server).ping().await.is_ok());
}

// ────────────────────────────────────────────────────────────────────────────
// Data Layer Over HTTP
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_repeated_list_hits_backend_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            task_row(1, "first"),
            task_row(2, "second")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::with_access_token(Arc::new(store_for(&server)), "user-token");

    let first = db.tasks().list().await.unwrap();
    let second = db.tasks().list().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(
        first.iter().map(|t| t.id).collect::<Vec<_>>(),
        second.iter().map(|t| t.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_write_forces_refetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_row(1, "first")])))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([task_row(2, "new")])))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::new(Arc::new(store_for(&server)));

    db.tasks().list().await.unwrap();
    let created = db
        .tasks()
        .create(&NewTask::new(Uuid::new_v4(), "new", ""))
        .await
        .unwrap()
        .expect("inserted row");
    assert_eq!(created.id, 2);
    db.tasks().list().await.unwrap();
}

#[tokio::test]
async fn test_update_matching_nothing_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let db = Database::new(Arc::new(store_for(&server)));
    let err = db
        .tasks()
        .update(99, &TaskChanges::rename("ghost"))
        .await
        .unwrap_err();

    let remote = err.as_remote().expect("remote error");
    assert_eq!(remote.status, Some(404));
}

#[tokio::test]
async fn test_invalid_payload_never_leaves_the_process() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let db = Database::new(Arc::new(store_for(&server)));
    let err = db
        .tasks()
        .create(&NewTask::new(Uuid::new_v4(), "   ", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, DataError::Invalid { .. }));
}
