//! Credential handling of the HTTP client

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use ficha_semanal::domain::Submission;
use ficha_semanal::infrastructure::crypto::{encode, SubmitClaims};
use ficha_semanal::{AppConfig, ClientError, Credential, FichaClient, ServerHandle, ServerOptions};

fn timesheet() -> Submission {
    serde_json::from_value(json!({
        "colaborador": {"nome": "Ana Costa", "cpf": "52998224725"},
        "periodo": {"inicio": "2024-06-03", "fim": "2024-06-07"},
        "tarefas": [{"numero": 1, "descricao": "Visita técnica", "dias": {"quarta": true}}]
    }))
    .unwrap()
}

async fn start_server() -> ServerHandle {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.database.url = "memory".into();
    config.security.jwt_secret = Some("client-test-secret".into());
    config.security.api_secret_key = Some("write-key".into());
    config.security.powerbi_api_key = Some("read-key".into());

    ServerHandle::start(ServerOptions {
        config,
        auto_migrate: false,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn fetches_token_when_none_is_held() {
    let server = start_server().await;
    let client = FichaClient::new(server.base_url());

    let mut credential = None;
    let created = client.submit(&mut credential, &timesheet()).await.unwrap();
    assert!(created.success);
    assert!(credential.is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn stale_credential_is_replaced_once() {
    let server = start_server().await;
    let client = FichaClient::new(server.base_url());

    let stale = encode(
        &SubmitClaims::issue_at(chrono::Utc::now().timestamp()),
        b"rotated-away-secret",
    )
    .unwrap();
    let mut credential = Some(Credential {
        token: stale,
        expires_in: 3600,
    });

    let created = client.submit(&mut credential, &timesheet()).await.unwrap();
    assert!(created.success);

    let report = client.fetch_report("read-key").await.unwrap();
    assert_eq!(report.total_fichas, 1);
    assert_eq!(report.dados[0].ficha_id, created.id);

    server.shutdown().await;
}

#[tokio::test]
async fn api_key_endpoints() {
    let server = start_server().await;
    let client = FichaClient::new(server.base_url());

    let created = client.submit_with_api_key("write-key", &timesheet()).await.unwrap();
    assert!(!created.id.is_empty());

    let err = client.fetch_report("write-key").await.unwrap_err();
    match err {
        ClientError::Rejected { status, error, .. } => {
            assert_eq!(status, 401);
            assert_eq!(error, "Invalid API key.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    server.shutdown().await;
}

#[derive(Clone, Default)]
struct Counters {
    tokens: Arc<AtomicUsize>,
    submits: Arc<AtomicUsize>,
}

async fn fake_token(State(c): State<Counters>) -> Json<Value> {
    let n = c.tokens.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "token": format!("t{n}"), "expiresIn": 3600}))
}

async fn always_unauthorized(State(c): State<Counters>) -> (StatusCode, Json<Value>) {
    c.submits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "error": "Invalid authentication token"})),
    )
}

#[tokio::test]
async fn retries_exactly_once_after_401() {
    let counters = Counters::default();
    let app = Router::new()
        .route("/get-token", get(fake_token))
        .route("/salvar-ficha", post(always_unauthorized))
        .with_state(counters.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = FichaClient::new(format!("http://{addr}"));
    let mut credential = None;
    let err = client.submit(&mut credential, &timesheet()).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(counters.tokens.load(Ordering::SeqCst), 2);
    assert_eq!(counters.submits.load(Ordering::SeqCst), 2);
    assert_eq!(credential.map(|c| c.token).as_deref(), Some("t1"));
}
