// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use leafscan::errors::GatewayError;
use leafscan::models::StagedFile;
use leafscan::services::{AnalysisService, Gateway};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

/// Scripted gateway: responses are queued up front and popped per call.
/// `gate_next` makes the next call block until the returned Notify fires,
/// which is how the in-flight/stale scenarios are driven.
#[derive(Default)]
pub struct FakeGateway {
    responses: Mutex<VecDeque<Result<Value, GatewayError>>>,
    byte_responses: Mutex<VecDeque<Result<Vec<u8>, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_error(&self, error: GatewayError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn push_bytes(&self, data: Vec<u8>) {
        self.byte_responses.lock().unwrap().push_back(Ok(data));
    }

    pub fn gate_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().take();
        if let Some(notify) = gate {
            notify.notified().await;
        }
    }

    fn next_response(&self, context: &str) -> Result<Value, GatewayError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {context}"))
    }

    fn record(&self, method: &str, path: &str, body: Option<Value>, query: &[(String, String)]) {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            path: path.to_string(),
            body,
            query: query.to_vec(),
        });
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<Value, GatewayError> {
        self.record(method.as_str(), path, body, query);
        self.wait_gate().await;
        self.next_response(path)
    }

    async fn send_multipart(&self, path: &str, file: StagedFile) -> Result<Value, GatewayError> {
        let body = serde_json::json!({
            "filename": file.filename,
            "content_type": file.content_type,
            "bytes": file.data.len(),
        });
        self.record("MULTIPART", path, Some(body), &[]);
        self.wait_gate().await;
        self.next_response(path)
    }

    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        self.record("GET", path, None, &[]);
        self.byte_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted bytes for {path}"))
    }

    fn url_for(&self, path: &str) -> String {
        format!("http://fake.test{path}")
    }
}

pub fn service_with(gateway: Arc<FakeGateway>) -> Arc<AnalysisService> {
    let gateway: Arc<dyn Gateway> = gateway;
    Arc::new(AnalysisService::new(gateway))
}
