//! HTTP client for the timesheet service
//!
//! The caller owns the [`Credential`]. [`FichaClient::submit`] fetches one
//! when absent, discards it after a successful write and, on a 401,
//! replaces it and retries exactly once.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::submission::Submission;
use crate::interfaces::http::middleware::API_KEY_HEADER;
use crate::interfaces::http::modules::submissions::{ExportResponse, SubmissionCreated};
use crate::interfaces::http::modules::tokens::TokenResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {error}")]
    Rejected {
        status: u16,
        error: String,
        message: Option<String>,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Rejected { status, .. } => Some(*status),
        }
    }
}

/// A bearer token obtained from `GET /get-token`
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub expires_in: i64,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    #[serde(default)]
    error: String,
    message: Option<String>,
}

async fn rejected(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    match response.json::<RemoteError>().await {
        Ok(body) => ClientError::Rejected {
            status,
            error: body.error,
            message: body.message,
        },
        Err(_) => ClientError::Rejected {
            status,
            error: "unreadable error body".to_string(),
            message: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct FichaClient {
    http: reqwest::Client,
    base_url: String,
}

impl FichaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /get-token`
    pub async fn fetch_token(&self) -> Result<Credential, ClientError> {
        let response = self.http.get(self.url("/get-token")).send().await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        let body: TokenResponse = response.json().await?;
        debug!(expires_in = body.expires_in, "Fetched submit token");
        Ok(Credential {
            token: body.token,
            expires_in: body.expires_in,
        })
    }

    async fn post_submission(
        &self,
        token: &str,
        submission: &Submission,
    ) -> Result<reqwest::Response, ClientError> {
        Ok(self
            .http
            .post(self.url("/salvar-ficha"))
            .bearer_auth(token)
            .json(submission)
            .send()
            .await?)
    }

    /// `POST /salvar-ficha` with a bearer token.
    pub async fn submit(
        &self,
        credential: &mut Option<Credential>,
        submission: &Submission,
    ) -> Result<SubmissionCreated, ClientError> {
        let current = match credential.take() {
            Some(c) => c,
            None => self.fetch_token().await?,
        };

        let mut response = self.post_submission(&current.token, submission).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Submit token rejected; fetching a new one");
            let fresh = self.fetch_token().await?;
            response = self.post_submission(&fresh.token, submission).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                *credential = Some(fresh);
            }
        }

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(response.json().await?)
    }

    /// `POST /api-fichas` with the write API key
    pub async fn submit_with_api_key(
        &self,
        api_key: &str,
        submission: &Submission,
    ) -> Result<SubmissionCreated, ClientError> {
        let response = self
            .http
            .post(self.url("/api-fichas"))
            .header(API_KEY_HEADER, api_key)
            .json(submission)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(response.json().await?)
    }

    /// `GET /api-powerbi` with the read API key
    pub async fn fetch_report(&self, api_key: &str) -> Result<ExportResponse, ClientError> {
        let response = self
            .http
            .get(self.url("/api-powerbi"))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(response.json().await?)
    }
}
