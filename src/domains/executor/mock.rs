//! Scripted executor for handler tests. Never touches the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::RequestExecutor;
use super::request::ApiRequest;
use crate::domains::tools::ToolResult;

#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: Mutex<VecDeque<ToolResult<Value>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call. Calls past the end of the
    /// script return `null`.
    pub fn then(self, result: ToolResult<Value>) -> Self {
        self.responses.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().iter().map(ApiRequest::path_display).collect()
    }

    pub fn last_call(&self) -> Option<ApiRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(&self, request: &ApiRequest) -> ToolResult<Value> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}
