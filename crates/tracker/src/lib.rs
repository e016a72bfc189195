//! SG Status Relay ShotGrid adapter.
//!
//! Implements the [`propagation::EntityTracker`] trait over the ShotGrid REST
//! API (v1) using script credentials.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication, request formatting,
//! and response decoding live here. The [`propagation`] crate sees only
//! [`propagation::EntityTracker`].
//!
//! ## Endpoints used
//!
//! | Operation | Request |
//! |-----------|---------|
//! | authenticate | `POST /api/v1/auth/access_token` (client-credentials grant) |
//! | find | `GET /api/v1/entity/{collection}/{id}?fields=...` |
//! | update | `PUT /api/v1/entity/{collection}/{id}` |
//! | batch update | `POST /api/v1/entity/_batch` |
//!
//! There are no retries. A `401` drops the cached token so the next call
//! re-authenticates.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use propagation::{
    EntityTracker, Shot, ShotId, Status, Task, TaskId, TrackerError, Version, VersionId,
    STATUS_FIELD,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

mod auth;
mod records;

use auth::{credentials_form, AccessToken, TokenResponse};
use records::{Envelope, Record, SHOT_FIELDS, TASK_FIELDS, VERSION_FIELDS};

const VERSIONS: &str = "versions";
const TASKS: &str = "tasks";
const SHOTS: &str = "shots";

/// Connection settings for a ShotGrid site.
#[derive(Debug, Clone)]
pub struct ShotGridConfig {
    /// Site URL, e.g. `https://studio.shotgrid.autodesk.com`.
    pub base_url: String,
    /// Name of the API script registered on the site.
    pub script_name: String,
    /// The script's application key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`EntityTracker`] backed by the ShotGrid REST API.
pub struct ShotGridClient {
    http: reqwest::Client,
    base_url: String,
    script_name: String,
    api_key: String,
    token: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for ShotGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotGridClient")
            .field("base_url", &self.base_url)
            .field("script_name", &self.script_name)
            .finish_non_exhaustive()
    }
}

impl ShotGridClient {
    /// Builds a client. No network traffic happens until the first call.
    pub fn new(config: ShotGridConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("sg-status-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            script_name: config.script_name,
            api_key: config.api_key,
            token: Mutex::new(None),
        })
    }

    /// Site URL with any trailing `/` removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Obtains a bearer token up front so credential problems surface at
    /// start-up rather than on the first webhook.
    pub async fn connect(&self) -> Result<(), TrackerError> {
        self.bearer().await.map(|_| ())
    }

    fn entity_url(&self, collection: &str, id: u64) -> String {
        format!("{}/api/v1/entity/{collection}/{id}", self.base_url)
    }

    async fn bearer(&self) -> Result<String, TrackerError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value().to_string());
        }

        debug!(script_name = %self.script_name, "Requesting ShotGrid access token");
        let issued_at = Instant::now();
        let response = self
            .http
            .post(format!("{}/api/v1/auth/access_token", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&credentials_form(&self.script_name, &self.api_key))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Authentication {
                message: format!("{status}: {body}"),
            });
        }

        let parsed: TokenResponse = response.json().await.map_err(decode)?;
        info!(token_type = ?parsed.token_type, expires_in = parsed.expires_in, "Obtained ShotGrid access token");
        let token = AccessToken::from_response(parsed, issued_at);
        let value = token.value().to_string();
        *cached = Some(token);
        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Sends an authenticated request and returns the response when it
    /// succeeded or was a 404 (left for the caller to interpret).
    async fn send(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        let token = self.bearer().await?;
        let response = request
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.forget_token().await;
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, body))
    }

    async fn find(&self, collection: &str, id: u64, fields: &[&str]) -> Result<Option<Record>, TrackerError> {
        let request = self
            .http
            .get(self.entity_url(collection, id))
            .query(&[("fields", fields.join(","))]);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<Record> = parse(response).await?;
        Ok(Some(envelope.data))
    }

    async fn update_status(&self, collection: &str, id: u64, status: &Status) -> Result<Record, TrackerError> {
        let request = self
            .http
            .request(Method::PUT, self.entity_url(collection, id))
            .json(&status_body(status));
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(classify_failure(StatusCode::NOT_FOUND, format!("{collection}/{id}")));
        }
        let envelope: Envelope<Record> = parse(response).await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl EntityTracker for ShotGridClient {
    #[instrument(skip_all, fields(version_id = %id))]
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, TrackerError> {
        let record = self.find(VERSIONS, id.as_u64(), VERSION_FIELDS).await?;
        Ok(record.map(Record::into_version))
    }

    #[instrument(skip_all, fields(task_id = %id))]
    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, TrackerError> {
        let record = self.find(TASKS, id.as_u64(), TASK_FIELDS).await?;
        Ok(record.map(Record::into_task))
    }

    #[instrument(skip_all, fields(shot_id = %id))]
    async fn find_shot(&self, id: ShotId) -> Result<Option<Shot>, TrackerError> {
        let record = self.find(SHOTS, id.as_u64(), SHOT_FIELDS).await?;
        Ok(record.map(Record::into_shot))
    }

    #[instrument(skip_all, fields(count = ids.len(), status = %status))]
    async fn set_task_statuses(
        &self,
        ids: &[TaskId],
        status: &Status,
    ) -> Result<Vec<Task>, TrackerError> {
        let request = self
            .http
            .post(format!("{}/api/v1/entity/_batch", self.base_url))
            .json(&batch_status_body("Task", ids.iter().map(|id| id.as_u64()), status));
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(classify_failure(StatusCode::NOT_FOUND, "_batch".to_string()));
        }
        let envelope: Envelope<Vec<Record>> = parse(response).await?;
        Ok(envelope.data.into_iter().map(Record::into_task).collect())
    }

    #[instrument(skip_all, fields(shot_id = %id, status = %status))]
    async fn set_shot_status(&self, id: ShotId, status: &Status) -> Result<Shot, TrackerError> {
        let record = self.update_status(SHOTS, id.as_u64(), status).await?;
        Ok(record.into_shot())
    }

    #[instrument(skip_all, fields(version_id = %id, status = %status))]
    async fn set_version_status(
        &self,
        id: VersionId,
        status: &Status,
    ) -> Result<Version, TrackerError> {
        let record = self.update_status(VERSIONS, id.as_u64(), status).await?;
        Ok(record.into_version())
    }
}

// ---------------------------------------------------------------------------
// Request bodies and error mapping
// ---------------------------------------------------------------------------

fn status_body(status: &Status) -> Value {
    json!({ STATUS_FIELD: status.as_str() })
}

fn batch_status_body(entity_type: &str, ids: impl Iterator<Item = u64>, status: &Status) -> Value {
    let requests: Vec<Value> = ids
        .map(|id| {
            json!({
                "request_type": "update",
                "entity": entity_type,
                "record_id": id,
                "data": status_body(status),
            })
        })
        .collect();
    json!({ "requests": requests })
}

fn classify_failure(status: StatusCode, body: String) -> TrackerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TrackerError::Authentication { message: body }
        }
        _ => TrackerError::UnexpectedStatus {
            status: status.as_u16(),
            message: body,
        },
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
    response.json::<T>().await.map_err(decode)
}

fn transport(e: reqwest::Error) -> TrackerError {
    TrackerError::Transport {
        message: e.to_string(),
    }
}

fn decode(e: reqwest::Error) -> TrackerError {
    TrackerError::Decode {
        message: e.to_string(),
    }
}
