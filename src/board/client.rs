use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::core::urls::ApiUrls;
use crate::tasks::types::{CreateTaskRequest, StatusUpdateRequest, Task, TaskQuery, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
        }
    }
}

/// The three calls the board makes against the task service.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, filter: &TaskQuery) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, ClientError>;
    async fn update_status(&self, id: i32, status: TaskStatus) -> Result<Task, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(builder).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    debug!("API error {status}: {message}");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self, filter: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let builder = self.http.get(self.url(ApiUrls::TASKS)).query(filter);
        self.send(builder).await
    }

    async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, ClientError> {
        let builder = self.http.post(self.url(ApiUrls::TASKS)).json(req);
        self.send(builder).await
    }

    async fn update_status(&self, id: i32, status: TaskStatus) -> Result<Task, ClientError> {
        let body = StatusUpdateRequest {
            status: status.to_string(),
            expected_version: None,
        };
        let builder = self
            .http
            .patch(self.url(&ApiUrls::with_id(ApiUrls::TASK_STATUS, id)))
            .json(&body);
        self.send(builder).await
    }
}
