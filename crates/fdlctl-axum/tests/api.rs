//! Router-level integration tests for the panel API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use fdlctl_axum::{AuthConfig, CorsConfig, ServerConfig, bootstrap, create_router};
use fdlctl_runtime::PipelineConfig;

fn test_config(work_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        port: 0,
        auth: AuthConfig {
            signing_key: "integration-test-key".to_string(),
            panel_password: "letmein".to_string(),
            token_ttl_seconds: 300,
        },
        pipeline: PipelineConfig::new(work_dir),
        cors: CorsConfig::AllowAll,
    }
}

fn app(config: &ServerConfig) -> Router {
    create_router(bootstrap(config), &config.cors)
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/auth", None, json!({"password": "letmein"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().expect("token in body").to_string()
}

#[tokio::test]
async fn health_is_open() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_require_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));

    for request in [
        get("/api/status", None),
        get("/api/log", None),
        get("/api/stream", None),
        post_json("/api/cancel", None, json!({})),
        post_json("/api/reset", None, json!({})),
        post_json("/api/start", None, json!({})),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let response = app
        .oneshot(post_json("/api/auth", None, json!({"password": "guess"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let response = app
        .oneshot(get("/api/status", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_token_unlocks_status() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let token = login(&app).await;

    let response = app
        .oneshot(get("/api/status", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["isRunning"], json!(false));
    assert_eq!(body["log"], json!([]));
}

#[tokio::test]
async fn stream_accepts_query_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let token = login(&app).await;

    let response = app
        .oneshot(get(&format!("/api/stream?token={token}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn reset_when_idle_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let token = login(&app).await;

    let response = app
        .oneshot(post_json("/api/reset", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn start_requires_complete_remote_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(dir.path()));
    let token = login(&app).await;

    let response = app
        .oneshot(post_json(
            "/api/start",
            Some(&token),
            json!({"remoteSource": true, "remoteHost": "h"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
mod run_flow {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    fn write_exec(path: &Path, body: &str) {
        std::fs::write(path, body).unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    fn fake_pipeline(dir: &Path, python_body: &str) -> PipelineConfig {
        let venv_bin = dir.join("venv/bin");
        std::fs::create_dir_all(&venv_bin).unwrap();
        write_exec(&venv_bin.join("pip"), "#!/bin/sh\nexit 0\n");
        write_exec(&venv_bin.join("python"), python_body);
        std::fs::write(dir.join("cssfdlp.py"), "# stand-in\n").unwrap();
        std::fs::write(dir.join("requirements.txt"), "boto3\n").unwrap();
        std::fs::write(dir.join("cstrike.zip"), "zip").unwrap();

        let mut config = PipelineConfig::new(dir);
        config.local_zip = Some(dir.join("cstrike.zip"));
        config
    }

    async fn wait_for_completion(app: &Router, token: &str) -> Value {
        for _ in 0..100 {
            let response = app
                .clone()
                .oneshot(get("/api/status", Some(token)))
                .await
                .unwrap();
            let body = body_json(response).await;
            if body["isRunning"] == json!(false) && !body["log"].as_array().unwrap().is_empty() {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("run did not complete in time");
    }

    #[tokio::test]
    async fn local_run_flows_through_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.pipeline = fake_pipeline(dir.path(), "#!/bin/sh\necho 'processing maps'\nexit 0\n");
        let app = app(&config);
        let token = login(&app).await;

        let response = app
            .clone()
            .oneshot(post_json("/api/start", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], json!(true));

        let status = wait_for_completion(&app, &token).await;
        let log = status["log"].as_array().unwrap();
        assert_eq!(log[0]["type"], json!("setup"));
        assert_eq!(log.last().unwrap()["type"], json!("complete"));

        let response = app
            .clone()
            .oneshot(get("/api/log", Some(&token)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(!body["log"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_while_running_reports_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.pipeline = fake_pipeline(dir.path(), "#!/bin/sh\nsleep 2\n");
        let app = app(&config);
        let token = login(&app).await;

        let first = app
            .clone()
            .oneshot(post_json("/api/start", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(first).await["success"], json!(true));

        let second = app
            .clone()
            .oneshot(post_json("/api/start", Some(&token), json!({})))
            .await
            .unwrap();
        let body = body_json(second).await;
        assert_eq!(body["success"], json!(false));
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("already in progress")
        );

        // A reset during the run is refused.
        let reset = app
            .clone()
            .oneshot(post_json("/api/reset", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(reset).await["success"], json!(false));

        wait_for_completion(&app, &token).await;
    }
}
