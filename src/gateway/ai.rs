use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{GatewayClient, GatewayError};

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    command: &'a str,
    context: &'a Value,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    framework: &'a str,
}

/// AI endpoints of the gateway
#[derive(Clone)]
pub struct AiService {
    gateway: Arc<GatewayClient>,
    framework: String,
}

impl AiService {
    pub fn new(gateway: Arc<GatewayClient>, framework: impl Into<String>) -> Self {
        Self {
            gateway,
            framework: framework.into(),
        }
    }

    /// Forward a terminal command together with its session context
    pub async fn process_command(&self, command: &str, context: &Value) -> Result<Value, GatewayError> {
        let request = ProcessRequest {
            command,
            context,
            timestamp: Utc::now().timestamp_millis(),
        };

        self.gateway.post("/ai/process", &request).await.map_err(|e| {
            tracing::error!("AI processing error: {}", e);
            e
        })
    }

    /// Ask the backend to generate code; `kind` is usually `component`
    pub async fn generate_code(&self, prompt: &str, kind: &str) -> Result<Value, GatewayError> {
        let request = GenerateRequest {
            prompt,
            kind,
            framework: &self.framework,
        };

        self.gateway.post("/ai/generate", &request).await.map_err(|e| {
            tracing::error!("Code generation error: {}", e);
            e
        })
    }

    pub async fn get_suggestions(&self, input: &str) -> Result<Value, GatewayError> {
        self.gateway
            .get("/ai/suggestions", &[("input", input)])
            .await
            .map_err(|e| {
                tracing::error!("Suggestions error: {}", e);
                e
            })
    }
}
