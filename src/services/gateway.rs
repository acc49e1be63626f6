// src/services/gateway.rs
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::GatewayError;
use crate::models::StagedFile;
use crate::session::Session;

/// Seam between the typed facade and the actual transport. Implemented by
/// `HttpGateway` in production and by scripted fakes in tests.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<Value, GatewayError>;

    async fn send_multipart(&self, path: &str, file: StagedFile) -> Result<Value, GatewayError>;

    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, GatewayError>;

    fn url_for(&self, path: &str) -> String;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn note_status(&self, status: StatusCode) {
        // A rejected credential is dead; drop it so the caller can re-authenticate.
        if status == StatusCode::UNAUTHORIZED && self.session.is_authenticated() {
            warn!("credential rejected with 401, clearing session");
            self.session.clear();
        }
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        self.note_status(status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_parts(status.as_u16(), &body))
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status().as_u16();
        let text = response.text().await.map_err(GatewayError::transport)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| GatewayError {
            status_code: Some(status),
            message: Some(format!("invalid response body: {e}")),
        })
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

fn error_from_parts(status_code: u16, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.trim().is_empty());
    GatewayError::http(status_code, detail)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<Value, GatewayError> {
        let url = self.url_for(path);
        debug!("{method} {url}");
        let mut request = self.authorize(self.client.request(method, &url));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| {
            warn!("request to {url} failed: {e}");
            GatewayError::transport(e)
        })?;
        let response = self.check(response).await?;
        self.read_json(response).await
    }

    async fn send_multipart(&self, path: &str, file: StagedFile) -> Result<Value, GatewayError> {
        let url = self.url_for(path);
        debug!("POST {url} (multipart, {} bytes)", file.data.len());
        let part = reqwest::multipart::Part::bytes(file.data)
            .file_name(file.filename)
            .mime_str(&file.content_type)
            .map_err(GatewayError::transport)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.authorize(self.client.post(&url)).multipart(form);
        let response = request.send().await.map_err(|e| {
            warn!("upload to {url} failed: {e}");
            GatewayError::transport(e)
        })?;
        let response = self.check(response).await?;
        self.read_json(response).await
    }

    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        let url = self.url_for(path);
        debug!("GET {url} (raw)");
        let request = self.authorize(self.client.get(&url));
        let response = request.send().await.map_err(GatewayError::transport)?;
        let response = self.check(response).await?;

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk.map_err(GatewayError::transport)?;
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
