//! HTTP client for the admin API, so the category editor can run against a
//! remote server exactly as it runs in-process.

use std::time::Duration;

use async_trait::async_trait;
use db::models::{
    category::{
        Category, CategorySummary, CategoryWithTools, DeleteCategories, DeletedCategories,
        UpsertCategory,
    },
    tool::ToolSummary,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::{
    category_editor::{ActionError, CategoryEditorSource, CategoryUpsert},
    category_tree::CategoryTreeNode,
};

pub const DEFAULT_ADMIN_API_URL: &str = "http://127.0.0.1:3001";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error)]
pub enum AdminClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("json error: {0}")]
    Serde(String),
    /// The server answered with an error envelope
    #[error("{0}")]
    Api(String),
}

impl From<reqwest::Error> for AdminClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Serde(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<AdminClientError> for ActionError {
    fn from(err: AdminClientError) -> Self {
        ActionError::new(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: String,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdminClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdminClientError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Reads `ADMIN_API_URL`, falling back to [`DEFAULT_ADMIN_API_URL`]
    pub fn from_env() -> Result<Self, AdminClientError> {
        let base_url = std::env::var("ADMIN_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolSummary>, AdminClientError> {
        self.get("/api/admin/tools").await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>, AdminClientError> {
        self.get("/api/admin/categories").await
    }

    pub async fn category_tree(&self) -> Result<Vec<CategoryTreeNode>, AdminClientError> {
        self.get("/api/admin/categories/tree").await
    }

    /// `None` when the server has no category with this slug
    pub async fn find_category(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryWithTools>, AdminClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/admin/categories/by-slug/{slug}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_envelope(response).await.map(Some)
    }

    pub async fn save_category(&self, data: &UpsertCategory) -> Result<Category, AdminClientError> {
        self.post("/api/admin/categories", data).await
    }

    pub async fn delete_categories(&self, ids: Vec<Uuid>) -> Result<u64, AdminClientError> {
        let deleted: DeletedCategories = self
            .post("/api/admin/categories/delete", &DeleteCategories { ids })
            .await?;
        Ok(deleted.deleted)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AdminClientError> {
        debug!(path, "GET admin api");
        let response = self.http.get(self.url(path)).send().await?;
        read_envelope(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AdminClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST admin api");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        read_envelope(response).await
    }
}

/// Unwrap an `ApiResponse`, turning error envelopes into [`AdminClientError::Api`]
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, AdminClientError> {
    let status = response.status();
    let body = response.text().await?;

    let envelope: ApiResponse<T, serde_json::Value> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(AdminClientError::Serde(e.to_string())),
        Err(_) => {
            return Err(AdminClientError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
    };

    if envelope.is_success() {
        return envelope
            .into_data()
            .ok_or_else(|| AdminClientError::Serde("response carried no data".to_string()));
    }

    let message = envelope
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    warn!(status = status.as_u16(), message = %message, "Admin api returned an error");
    Err(AdminClientError::Api(message))
}

#[async_trait]
impl CategoryEditorSource for AdminClient {
    async fn tools(&self) -> Result<Vec<ToolSummary>, ActionError> {
        Ok(self.list_tools().await?)
    }

    async fn categories(&self) -> Result<Vec<CategorySummary>, ActionError> {
        Ok(self.list_categories().await?)
    }

    async fn category(&self, slug: &str) -> Result<Option<CategoryWithTools>, ActionError> {
        Ok(self.find_category(slug).await?)
    }
}

#[async_trait]
impl CategoryUpsert for AdminClient {
    async fn upsert_category(&self, data: UpsertCategory) -> Result<Category, ActionError> {
        Ok(self.save_category(&data).await?)
    }
}
