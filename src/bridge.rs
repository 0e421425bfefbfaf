//! JSON message bridge
//!
//! Speaks the UI transport's wire format: each inbound message is a
//! [`RequestEnvelope`] serialized as JSON, each reply is a [`BridgeReply`]
//! carrying either the report text or an error message, stamped with Unix
//! milliseconds.

use crate::orchestrator::BuildOrchestrator;
use crate::request::RequestEnvelope;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: i64,
}

impl BridgeReply {
    pub fn success(result: String) -> Self {
        Self {
            result: Some(result),
            error: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

#[derive(Clone)]
pub struct MessageBridge {
    orchestrator: Arc<BuildOrchestrator>,
}

impl MessageBridge {
    pub fn new(orchestrator: Arc<BuildOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Handles one JSON message. Never fails: malformed messages and rejected
    /// requests become error replies.
    pub async fn handle_message(&self, message: &str) -> BridgeReply {
        let envelope: RequestEnvelope = match serde_json::from_str(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Rejected malformed message: {}", e);
                return BridgeReply::failure(format!("Invalid message: {}", e));
            }
        };

        match self.orchestrator.process(envelope).await {
            Ok(report) => BridgeReply::success(report.to_string()),
            Err(e) => BridgeReply::failure(e.to_string()),
        }
    }

    /// Reads one message per line until EOF and writes one JSON reply per line.
    /// Blank lines are ignored. Requests are handled in arrival order.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let reply = self.handle_message(&line).await;
            debug!(success = reply.is_success(), "Writing bridge reply");

            let mut encoded = serde_json::to_string(&reply)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
            handled += 1;
        }

        Ok(handled)
    }
}
