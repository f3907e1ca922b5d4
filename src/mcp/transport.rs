//! Newline-delimited JSON-RPC transport
//!
//! Frames are read from any async byte stream and dispatched concurrently, one
//! task per frame. A single writer task serializes responses so frames never
//! interleave. On end of input, in-flight calls are drained before the writer
//! shuts down.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use super::protocol::{JsonRpcError, JsonRpcResponse};
use super::server::McpServer;
use crate::types::{IqPilotError, Result};

/// Largest accepted frame
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Serve the protocol over a reader/writer pair until the reader closes
#[tracing::instrument(name = "mcp_serve", skip_all)]
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut frames = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH));
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_frames(writer, rx));

    let mut in_flight = JoinSet::new();
    let mut frame_count: u64 = 0;

    while let Some(frame) = frames.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::warn!(max = MAX_FRAME_LENGTH, "Frame exceeds maximum length");
                send(&tx, parse_error_frame("frame too long"));
                continue;
            }
            Err(LinesCodecError::Io(e)) => {
                tracing::error!(error = %e, "Failed to read frame");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        frame_count += 1;

        let server = Arc::clone(&server);
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = server.handle_message(&line).await {
                send(&tx, Some(response));
            }
        });

        // Reap finished calls so the set stays small on long connections
        while let Some(result) = in_flight.try_join_next() {
            log_join_error(result);
        }
    }

    tracing::info!(
        frames = frame_count,
        in_flight = in_flight.len(),
        "Input closed, draining in-flight calls"
    );
    while let Some(result) = in_flight.join_next().await {
        log_join_error(result);
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| IqPilotError::internal(format!("writer task failed: {}", e)))?
}

async fn write_frames<W>(writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    while let Some(frame) = rx.recv().await {
        sink.send(frame).await.map_err(|e| match e {
            LinesCodecError::Io(e) => IqPilotError::Io(e),
            other => IqPilotError::internal(other.to_string()),
        })?;
    }
    SinkExt::<String>::close(&mut sink)
        .await
        .map_err(|e| IqPilotError::internal(e.to_string()))?;
    Ok(())
}

fn send(tx: &mpsc::UnboundedSender<String>, frame: Option<String>) {
    if let Some(frame) = frame {
        if tx.send(frame).is_err() {
            tracing::warn!("Response writer closed, dropping response");
        }
    }
}

fn parse_error_frame(detail: &str) -> Option<String> {
    let response = JsonRpcResponse::failure(serde_json::Value::Null, JsonRpcError::parse_error(detail));
    serde_json::to_string(&response).ok()
}

fn log_join_error(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Request task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ToolDefinition;
    use crate::mcp::registry::ToolRegistry;
    use crate::mcp::tools::{ToolArguments, ToolHandler};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[derive(Debug)]
    struct SleepTools;

    #[async_trait]
    impl ToolHandler for SleepTools {
        fn tools(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new("test/sleep", "Sleeps", json!({"type": "object"}))]
        }

        async fn execute(&self, _name: &str, arguments: ToolArguments) -> Result<String> {
            let ms = arguments.get("ms").and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(format!("slept {}", ms))
        }
    }

    fn server() -> Arc<McpServer> {
        let registry = ToolRegistry::from_handlers(vec![Arc::new(SleepTools)]).unwrap();
        Arc::new(McpServer::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn test_end_to_end_over_duplex() {
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let serve_task = tokio::spawn(serve(server(), server_read, server_write));

        let (client_read, mut client_write) = tokio::io::split(client);
        let frames = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "test/sleep", "arguments": {"ms": 150}}}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}),
        ];
        for frame in &frames {
            client_write
                .write_all(format!("{}\n", frame).as_bytes())
                .await
                .unwrap();
        }
        client_write.write_all(b"garbage\n\n").await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        let mut responses = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            responses.push(serde_json::from_str::<Value>(&line).unwrap());
        }
        serve_task.await.unwrap().unwrap();

        // One response per request plus the parse error; none for the notification
        assert_eq!(responses.len(), 4);

        let by_id = |id: i64| {
            responses
                .iter()
                .find(|r| r["id"] == json!(id))
                .cloned()
                .unwrap()
        };
        assert_eq!(by_id(1)["result"]["serverInfo"]["name"], "iqpilot");
        assert_eq!(by_id(2)["result"]["content"][0]["text"], "slept 150");
        assert_eq!(by_id(3)["result"]["tools"][0]["name"], "test/sleep");
        assert!(
            responses
                .iter()
                .any(|r| r["id"] == Value::Null && r["error"]["code"] == -32700)
        );

        // The slow call was drained after EOF and answered after the fast ones
        let slow_index = responses.iter().position(|r| r["id"] == json!(2)).unwrap();
        let list_index = responses.iter().position(|r| r["id"] == json!(3)).unwrap();
        assert!(slow_index > list_index);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (client, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (client_read, mut client_write) = tokio::io::split(client);
        client_write.shutdown().await.unwrap();

        serve(server(), server_read, server_write).await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        assert!(lines.next_line().await.unwrap().is_none());
    }
}
