//! Token issuance and verification against a running server

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};

use ficha_semanal::infrastructure::crypto::{encode, SubmitClaims};
use ficha_semanal::{AppConfig, ServerHandle, ServerOptions};

const SECRET: &str = "end-to-end-secret";

async fn start() -> ServerHandle {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.database.url = "memory".into();
    config.security.jwt_secret = Some(SECRET.into());
    config.security.api_secret_key = Some("write-key".into());
    config.security.powerbi_api_key = Some("read-key".into());

    ServerHandle::start(ServerOptions {
        config,
        auto_migrate: false,
    })
    .await
    .unwrap()
}

fn timesheet() -> Value {
    json!({
        "colaborador": {"nome": "João Pereira", "cpf": "111.444.777-35", "cargo": "Técnico"},
        "periodo": {"dataInicio": "2024-05-06", "dataFim": "2024-05-10"},
        "tarefas": [
            {"id": 1, "descricao": "Inspeção", "selecionada": true, "dias": {"segunda": true, "terca": true}},
            {"id": 2, "descricao": "Relatório", "dias": {"sexta": true}},
            {"id": 3, "descricao": "   "}
        ],
        "dificuldades": "Nenhuma"
    })
}

async fn submit(server: &ServerHandle, token: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/salvar-ficha", server.base_url()))
        .bearer_auth(token)
        .json(&timesheet())
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn issue(server: &ServerHandle) -> String {
    let body: Value = reqwest::get(format!("{}/get-token", server.base_url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn issued_token_submits_timesheet() {
    let server = start().await;
    let token = issue(&server).await;

    let (status, body) = submit(&server, &token).await;
    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    let id = body["id"].as_str().unwrap().to_string();

    let export: Value = reqwest::Client::new()
        .get(format!("{}/api-powerbi", server.base_url()))
        .header("x-api-key", "read-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(export["total_fichas"], 1);
    assert_eq!(export["total_registros"], 2);
    assert_eq!(export["dados"][0]["ficha_id"], id);
    assert_eq!(export["dados"][0]["colaborador_nome"], "João Pereira");
    assert_eq!(export["dados"][0]["ip_origem"], "127.0.0.1");

    server.shutdown().await;
}

#[tokio::test]
async fn forged_expiry_is_rejected_as_invalid() {
    let server = start().await;
    let token = issue(&server).await;

    let parts: Vec<&str> = token.split('.').collect();
    let mut claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    claims["exp"] = json!(claims["exp"].as_i64().unwrap() + 86_400 * 365);
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let (status, body) = submit(&server, &forged).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid authentication token");

    server.shutdown().await;
}

#[tokio::test]
async fn expired_token_is_rejected_as_expired() {
    let server = start().await;
    let claims = SubmitClaims::issue_at(Utc::now().timestamp() - 3 * 3600);
    let token = encode(&claims, SECRET.as_bytes()).unwrap();

    let (status, body) = submit(&server, &token).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Token has expired");

    server.shutdown().await;
}

#[tokio::test]
async fn token_for_other_audience_is_forbidden() {
    let server = start().await;
    let mut claims = SubmitClaims::issue_at(Utc::now().timestamp());
    claims.aud = "outro-sistema".into();
    let token = encode(&claims, SECRET.as_bytes()).unwrap();

    let (status, body) = submit(&server, &token).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Token not valid for this operation");

    server.shutdown().await;
}

#[tokio::test]
async fn api_key_gate_distinguishes_classes() {
    let server = start().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api-fichas", server.base_url());

    let missing = client.post(&url).json(&timesheet()).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let wrong = client
        .post(&url)
        .header("x-api-key", "read-key")
        .json(&timesheet())
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["error"], "Invalid API key.");

    let ok = client
        .post(&url)
        .header("x-api-key", "write-key")
        .header("x-forwarded-for", "198.51.100.23")
        .json(&timesheet())
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 201);

    let export: Value = client
        .get(format!("{}/api-powerbi", server.base_url()))
        .header("x-api-key", "read-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(export["dados"][0]["ip_origem"], "198.51.100.23");

    server.shutdown().await;
}
