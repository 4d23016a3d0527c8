use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{GatewayClient, GatewayError};

#[derive(Debug, Serialize)]
struct FileRequest<'a> {
    path: &'a str,
    content: &'a str,
}

/// Remote file management endpoints
#[derive(Clone)]
pub struct FileService {
    gateway: Arc<GatewayClient>,
}

impl FileService {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }

    pub async fn create_file(&self, path: &str, content: &str) -> Result<Value, GatewayError> {
        self.gateway
            .post("/files/create", &FileRequest { path, content })
            .await
            .map_err(|e| {
                tracing::error!("File creation error: {}", e);
                e
            })
    }

    pub async fn update_file(&self, path: &str, content: &str) -> Result<Value, GatewayError> {
        self.gateway
            .put("/files/update", &FileRequest { path, content })
            .await
            .map_err(|e| {
                tracing::error!("File update error: {}", e);
                e
            })
    }

    /// List files under `directory`; `None` lists the root
    pub async fn get_files(&self, directory: Option<&str>) -> Result<Value, GatewayError> {
        let directory = directory.unwrap_or("/");
        self.gateway
            .get("/files/list", &[("directory", directory)])
            .await
            .map_err(|e| {
                tracing::error!("File list error: {}", e);
                e
            })
    }
}
