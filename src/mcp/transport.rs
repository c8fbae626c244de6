use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::mcp::{
    errors::{MCPError, MCPResult, TransportError},
    protocol::{MCPMessage, MessageParser},
};

/// Transport types supported by the MCP server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportType {
    Stdio,
}

/// Abstract transport trait for MCP communication
#[async_trait]
pub trait MCPTransport: Send + Sync {
    /// Send a message through the transport
    async fn send(&mut self, message: MCPMessage) -> MCPResult<()>;

    /// Receive a message from the transport
    async fn receive(&mut self) -> MCPResult<MCPMessage>;

    /// Close the transport, flushing anything still queued for output
    async fn close(&mut self) -> MCPResult<()>;

    fn is_connected(&self) -> bool;

    fn transport_type(&self) -> TransportType;
}

/// Newline-delimited JSON-RPC over a reader/writer pair, normally stdin/stdout
pub struct StdioTransport {
    sender: Option<mpsc::UnboundedSender<MCPMessage>>,
    receiver: mpsc::UnboundedReceiver<MCPMessage>,
    writer_task: Option<JoinHandle<()>>,
    is_connected: Arc<AtomicBool>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::from_io(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Build a transport over arbitrary async streams
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (msg_sender, msg_receiver) = mpsc::unbounded_channel();
        let (response_sender, response_receiver) = mpsc::unbounded_channel::<MCPMessage>();
        let is_connected = Arc::new(AtomicBool::new(true));

        // Outgoing messages, one JSON document per line
        let is_connected_clone = is_connected.clone();
        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            let mut response_receiver = response_receiver;
            while let Some(message) = response_receiver.recv().await {
                let json_data = match MessageParser::serialize_message(&message) {
                    Ok(data) => data,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                let written = async {
                    writer.write_all(&json_data).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await
                }
                .await;

                if let Err(e) = written {
                    error!("Failed to write to stdout: {}", e);
                    is_connected_clone.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        // Incoming lines; malformed ones are answered directly
        let rejection_sender = response_sender.clone();
        let is_connected_clone = is_connected.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read from stdin: {}", e);
                        break;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                match MessageParser::parse_message(line.as_bytes()) {
                    Ok(mcp_message) => {
                        if msg_sender.send(mcp_message).is_err() {
                            warn!("Receiver dropped, closing stdio connection");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse MCP message from stdin: {}", e);
                        let _ = rejection_sender.send(MessageParser::rejection_for(line.as_bytes(), &e));
                    }
                }
            }

            debug!("stdin closed");
            is_connected_clone.store(false, Ordering::SeqCst);
        });

        Self {
            sender: Some(response_sender),
            receiver: msg_receiver,
            writer_task: Some(writer_task),
            is_connected,
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    async fn send(&mut self, message: MCPMessage) -> MCPResult<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(MCPError::Transport(TransportError::Closed))?;

        sender.send(message).map_err(|_| {
            MCPError::Transport(TransportError::ConnectionLost(
                "Stdio sender channel closed".to_string(),
            ))
        })
    }

    async fn receive(&mut self) -> MCPResult<MCPMessage> {
        self.receiver
            .recv()
            .await
            .ok_or(MCPError::Transport(TransportError::Closed))
    }

    async fn close(&mut self) -> MCPResult<()> {
        // Dropping the sender lets the writer drain its queue and exit
        self.sender.take();
        if let Some(writer_task) = self.writer_task.take() {
            writer_task.await.map_err(|e| {
                MCPError::Transport(TransportError::ConnectionLost(e.to_string()))
            })?;
        }
        self.is_connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Stdio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_round_trip_over_duplex() {
        let (client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, mut client_out) = tokio::io::duplex(4096);
        let mut transport = StdioTransport::from_io(server_in, server_out);
        assert_eq!(transport.transport_type(), TransportType::Stdio);

        let mut client_in = client_in;
        client_in
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .await
            .unwrap();

        let message = transport.receive().await.unwrap();
        assert!(message.is_request());
        assert_eq!(message.method.as_deref(), Some("ping"));

        transport
            .send(MCPMessage::response(json!(1), Some(json!({}))))
            .await
            .unwrap();
        drop(client_in);
        transport.close().await.unwrap();
        assert!(!transport.is_connected());

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let response: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_malformed_line_is_answered() {
        let (mut client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, mut client_out) = tokio::io::duplex(4096);
        let mut transport = StdioTransport::from_io(server_in, server_out);

        client_in.write_all(b"{oops\n").await.unwrap();
        drop(client_in);

        // stdin closing ends the receive side
        assert!(transport.receive().await.is_err());
        transport.close().await.unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let response: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(response["error"]["code"], json!(-32700));
        assert!(response["id"].is_null());
    }
}
