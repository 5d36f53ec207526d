// tests/test_http_api.rs
// Router-level tests: auth, /file, /exec, /metrics and transfers


use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use test_helpers::{body_json, create_test_app, get, post_json, test_config, write_fixture};

async fn init_token(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/init", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_init_only_once() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));

    let token = init_token(&app).await;
    assert!(token.starts_with("tok-"));

    let response = app
        .clone()
        .oneshot(post_json("/init", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ALREADY_INITIALIZED");
    assert_eq!(body["error"], "Token already initialized");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));

    let response = app.clone().oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "NOT_INITIALIZED");

    init_token(&app).await;

    let response = app
        .clone()
        .oneshot(get("/metrics", Some("tok-wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_TOKEN");

    let response = app.clone().oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_file_operations_over_http() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;
    let path = dir.path().join("edit.txt");

    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "create", "path": path, "file_text": "one\ntwo\nthree" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "str_replace", "path": path, "old_str": "two", "new_str": "2" }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["replaced"], 1);

    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "view", "path": path, "view_range": [2, 3] }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["content"], "2\nthree");
    assert_eq!(body["view_range"], json!([2, 3]));
    assert_eq!(body["lines"], 3);

    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "undo_edit", "path": path }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["success"], true);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\nthree");
}

#[tokio::test]
async fn test_file_request_errors() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;

    // Missing required field
    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "create", "path": dir.path().join("x") }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["error"], "file_text required for create command");

    // Malformed JSON
    let request = Request::builder()
        .method("POST")
        .uri("/file")
        .header("content-type", "application/json")
        .header("X-Token", &token)
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown command is a logical failure, not an HTTP error
    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "rename", "path": "/tmp/x" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Unknown command: rename");

    // Missing file
    let response = app
        .clone()
        .oneshot(post_json(
            "/file",
            Some(&token),
            json!({ "command": "view", "path": dir.path().join("absent.txt") }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[cfg(unix)]
#[tokio::test]
async fn test_exec_and_metrics() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;

    let response = app
        .clone()
        .oneshot(post_json("/exec", Some(&token), json!({ "command": "echo hi; exit 2" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stdout"], "hi");
    assert_eq!(body["exit_code"], 2);

    let response = app
        .clone()
        .oneshot(post_json("/exec", Some(&token), json!({ "command": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get("/metrics", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["command_count"], 1);
    // Two /exec calls plus this /metrics call
    assert_eq!(body["request_count"], 3);
    assert!(body["uptime"].is_string());
    assert!(body["tasks"].is_u64());
}

#[tokio::test]
async fn test_download_streams_file() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;
    let path = write_fixture(&dir, "report.bin", "payload");

    let uri = format!("/download?path={}", path.display());
    let response = app.clone().oneshot(get(&uri, Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=report.bin");
    assert_eq!(headers[header::CONTENT_LENGTH], "7");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"payload");

    let response = app.clone().oneshot(get("/download", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "File path required");

    let uri = format!("/download?path={}", dir.path().join("absent").display());
    let response = app.clone().oneshot(get(&uri, Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

const BOUNDARY: &str = "litterbox-test-boundary";

fn path_part(dir: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{dir}\r\n")
}

fn file_part(content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"../up.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n{content}\r\n"
    )
}

fn upload_request(token: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("X-Token", token)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn multipart_request(token: &str, target_dir: Option<&str>) -> Request<Body> {
    let mut body = target_dir.map(path_part).unwrap_or_default();
    body.push_str(&file_part("uploaded"));
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    upload_request(token, body)
}

#[tokio::test]
async fn test_upload_writes_basename_into_dir() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;

    // Explicit target directory, created on demand
    let target = dir.path().join("incoming");
    let target_str = target.display().to_string();
    let response = app
        .clone()
        .oneshot(multipart_request(&token, Some(&target_str)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["path"], target.join("up.txt").display().to_string());
    assert_eq!(std::fs::read_to_string(target.join("up.txt")).unwrap(), "uploaded");

    // Default directory from config
    let response = app.clone().oneshot(multipart_request(&token, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_to_string(dir.path().join("up.txt")).unwrap(), "uploaded");

    let response = app.clone().oneshot(get("/metrics", Some(&token))).await.unwrap();
    assert_eq!(body_json(response).await["upload_count"], 2);
}

#[tokio::test]
async fn test_upload_path_field_after_file_part() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;

    let target = dir.path().join("late");
    let body = format!(
        "{}{}--{BOUNDARY}--\r\n",
        file_part("streamed"),
        path_part(&target.display().to_string())
    );
    let response = app.clone().oneshot(upload_request(&token, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_to_string(target.join("up.txt")).unwrap(), "streamed");
    // Staged in the default dir, then moved out
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "late")
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}

#[tokio::test]
async fn test_truncated_upload_leaves_no_files() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(test_config(dir.path().to_path_buf()));
    let token = init_token(&app).await;

    // Body ends inside the file part with no closing boundary
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cut.txt\"\r\n\r\npartial data"
    );
    let response = app.clone().oneshot(upload_request(&token, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let response = app.clone().oneshot(get("/metrics", Some(&token))).await.unwrap();
    assert_eq!(body_json(response).await["upload_count"], 0);
}
