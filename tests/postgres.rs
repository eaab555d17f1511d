//! Integration tests against a live PostgreSQL.
//!
//! These tests read the usual DB_* environment variables (or .env).
//! Run with: cargo test --test postgres -- --ignored

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use todo_api::api::{create_router, AppState};
use todo_api::config::Config;
use todo_api::item::{ItemKey, NewItem};
use todo_api::store::{Connector, PgConnector};

/// Connector for the configured database, with the table in place.
async fn test_connector() -> Option<PgConnector> {
    let config = Config::load().ok()?;
    let connector = PgConnector::new(config);

    if let Err(e) = connector.init_schema().await {
        println!("Skipping: database not reachable: {}", e);
        return None;
    }

    Some(connector)
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn insert_and_delete_through_session() {
    let Some(connector) = test_connector().await else {
        return;
    };

    let mut session = connector.connect().await.expect("connection");
    let item = session
        .insert_item(&NewItem {
            name: "session test".to_string(),
            description: Some("from integration test".to_string()),
        })
        .await
        .unwrap();
    assert!(item.id > 0);
    assert_eq!(item.description.as_deref(), Some("from integration test"));

    let newest = session.list_items(0, 1).await.unwrap();
    assert_eq!(newest.first().map(|i| i.id), Some(item.id));

    assert_eq!(session.delete_item(ItemKey::from(item.id)).await.unwrap(), Some(item.id));
    assert_eq!(session.delete_item(ItemKey::from(item.id)).await.unwrap(), None);
    session.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn crud_round_trip_over_http() {
    let Some(connector) = test_connector().await else {
        return;
    };
    let app = create_router(AppState::new(connector));

    let (status, first) = send(&app, Method::POST, "/items/", Some(json!({"name": "A", "description": "B"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["name"], "A");
    assert_eq!(first["description"], "B");

    let (_, second) = send(&app, Method::POST, "/items/", Some(json!({"name": "C"}))).await;
    assert_eq!(second["description"], Value::Null);

    let (status, listed) = send(&app, Method::GET, "/items/?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], second["id"]);
    assert_eq!(listed[1]["id"], first["id"]);

    for item in [&first, &second] {
        let uri = format!("/items/{}", item["id"]);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn negative_limit_surfaces_driver_message() {
    let Some(connector) = test_connector().await else {
        return;
    };
    let app = create_router(AppState::new(connector));

    let (status, body) = send(&app, Method::GET, "/items/?limit=-1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("LIMIT"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn failed_insert_rolls_back_and_reports_driver_message() {
    let Some(connector) = test_connector().await else {
        return;
    };
    let app = create_router(AppState::new(connector));

    // Postgres text columns reject NUL bytes.
    let (status, body) = send(
        &app,
        Method::POST,
        "/items/",
        Some(json!({"name": "rollback marker\u{0000}", "description": "never stored"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("0x00"), "unexpected detail: {detail}");

    let (status, listed) = send(&app, Method::GET, "/items/?limit=10000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["description"] != "never stored"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn delete_beyond_int4_range_is_not_found() {
    let Some(connector) = test_connector().await else {
        return;
    };
    let app = create_router(AppState::new(connector));

    let (status, body) = send(&app, Method::DELETE, "/items/3000000000", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item 3000000000 not found");
}
