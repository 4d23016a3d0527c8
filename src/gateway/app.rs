use serde_json::Value;
use std::sync::Arc;

use super::{GatewayClient, GatewayError};

/// Application management endpoints
#[derive(Clone)]
pub struct AppService {
    gateway: Arc<GatewayClient>,
}

impl AppService {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }

    pub async fn get_status(&self) -> Result<Value, GatewayError> {
        self.gateway.get("/app/status", &[]).await.map_err(|e| {
            tracing::error!("Status error: {}", e);
            e
        })
    }

    pub async fn save_config(&self, config: &Value) -> Result<Value, GatewayError> {
        self.gateway.post("/app/config", config).await.map_err(|e| {
            tracing::error!("Config save error: {}", e);
            e
        })
    }

    pub async fn get_config(&self) -> Result<Value, GatewayError> {
        self.gateway.get("/app/config", &[]).await.map_err(|e| {
            tracing::error!("Config get error: {}", e);
            e
        })
    }
}
