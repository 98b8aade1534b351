//! HTTP-level tests: routing, envelopes and error status mapping.

mod helpers;

use std::collections::BTreeSet;
use std::io::Cursor;

use axum::http::StatusCode;
use serde_json::json;

use cloudvault_core::config::AppConfig;

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], true);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/directories/root", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_directory_lifecycle() {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await.user_id;

    let response = app
        .request("POST", "/api/directories", Some(alice), Some(json!({"name": "Docs"})))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["name"], "Docs");

    let response = app
        .request(
            "POST",
            "/api/directories",
            Some(alice),
            Some(json!({"name": "Docs", "parent": "root"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["name"], "Docs (1)");
    let copy_id = response.data()["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PUT",
            &format!("/api/directories/{copy_id}"),
            Some(alice),
            Some(json!({"name": "Docs"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "NO_OP");

    let response = app
        .request(
            "PUT",
            &format!("/api/directories/{copy_id}/move"),
            Some(alice),
            Some(json!({"parent": copy_id})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "SELF_PARENT");

    let response = app
        .request("GET", "/api/directories/root", Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["visibility"], "owned");
    assert!(response.data()["parent"].is_null());
    assert_eq!(response.data()["subdirectories"].as_array().unwrap().len(), 2);

    let response = app
        .request("DELETE", &format!("/api/directories/{copy_id}"), Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["directories"], 1);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await.user_id;

    let response = app
        .request("POST", "/api/directories", Some(alice), Some(json!({"name": ""})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");

    let response = app
        .request("POST", "/api/directories", Some(alice), Some(json!({"name": "a/b"})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("GET", "/api/directories/not-a-uuid", Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sharing_over_http() {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await.user_id;
    let bob = app.user("bob@example.com").await.user_id;
    let carol = app.user("carol@example.com").await.user_id;

    let response = app
        .request("POST", "/api/directories", Some(alice), Some(json!({"name": "Docs"})))
        .await;
    let docs = response.data()["id"].as_str().unwrap().to_string();
    let shares = format!("/api/directories/{docs}/shares");

    let response = app
        .request("POST", &shares, Some(alice), Some(json!({"email": "bob@example.com"})))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["grantee_email"], "bob@example.com");

    let response = app
        .request("POST", &shares, Some(alice), Some(json!({"email": "bob@example.com"})))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_SHARED");

    let response = app
        .request("POST", &shares, Some(alice), Some(json!({"email": "alice@example.com"})))
        .await;
    assert_eq!(response.error_code(), "SELF_SHARE");

    let response = app
        .request("POST", &shares, Some(alice), Some(json!({"email": "nope"})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.request("GET", "/api/shares/incoming", Some(bob), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["directories"][0]["name"], "Docs");

    let response = app
        .request(
            "PUT",
            &format!("/api/directories/{docs}"),
            Some(bob),
            Some(json!({"name": "Mine"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("GET", &format!("/api/directories/{docs}"), Some(carol), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("DELETE", &format!("{shares}/{bob}"), Some(carol), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &format!("{shares}/{bob}"), Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["removed"], 1);

    let response = app
        .request("GET", &format!("/api/directories/{docs}"), Some(bob), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_and_download() {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await.user_id;

    let response = app
        .upload_request(
            "/api/files?name=r%C3%A9sum%C3%A9.txt",
            alice,
            "text/plain; charset=utf-8",
            b"hello".to_vec(),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["name"], "résumé.txt");
    assert_eq!(response.data()["mime_type"], "text/plain");
    let file = response.data()["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "GET",
            &format!("/api/files/{file}/download?inline=true"),
            Some(alice),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.bytes[..], b"hello");
    let disposition = response.header("content-disposition");
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''r%C3%A9sum%C3%A9.txt"));

    let response = app
        .request("DELETE", &format!("/api/files/{file}"), Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .request("GET", &format!("/api/files/{file}"), Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.storage.max_upload_size_bytes = 16;
    let app = helpers::TestApp::with_config(config).await;
    let alice = app.user("alice@example.com").await.user_id;

    let response = app
        .upload_request(
            "/api/files?name=big.bin",
            alice,
            "application/octet-stream",
            vec![0u8; 64],
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);

    let response = app
        .upload_request(
            "/api/files?name=small.bin",
            alice,
            "application/octet-stream",
            vec![0u8; 16],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_archive_download() {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await.user_id;

    app.upload_request(
        "/api/files?relative_path=notes/today.txt",
        alice,
        "text/plain",
        b"today".to_vec(),
    )
    .await;

    let response = app
        .request("GET", "/api/directories/root/archive", Some(alice), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/zip");
    assert!(response.header("content-disposition").contains("My Files.zip"));

    let archive = zip::ZipArchive::new(Cursor::new(response.bytes.to_vec())).unwrap();
    let names: BTreeSet<&str> = archive.file_names().collect();
    assert!(names.contains("My Files/notes/today.txt"));
}
