//! IPC client for talking to the daemon.

use crate::error::{Result, SignseqError};
use crate::ipc::protocol::{Request, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

/// A connection to the daemon. The connection is one session.
pub struct SessionClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl SessionClient {
    /// Connect to the daemon socket, opening a new session.
    ///
    /// # Errors
    /// Returns `SignseqError::IpcConnection` if connection fails
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream =
            UnixStream::connect(socket_path)
                .await
                .map_err(|e| SignseqError::IpcConnection {
                    message: format!("Failed to connect to daemon: {}", e),
                })?;

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send one request and wait for its response.
    ///
    /// # Errors
    /// Returns `SignseqError::IpcConnection` on socket failures
    /// Returns `SignseqError::IpcProtocol` if serialization/deserialization fails
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        let request_json = request.to_json().map_err(|e| SignseqError::IpcProtocol {
            message: format!("Failed to serialize request: {}", e),
        })?;

        self.writer
            .write_all(request_json.as_bytes())
            .await
            .map_err(|e| SignseqError::IpcConnection {
                message: format!("Failed to write request: {}", e),
            })?;

        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| SignseqError::IpcConnection {
                message: format!("Failed to write newline: {}", e),
            })?;

        self.writer
            .flush()
            .await
            .map_err(|e| SignseqError::IpcConnection {
                message: format!("Failed to flush writer: {}", e),
            })?;

        let mut response_line = String::new();
        let read = self
            .reader
            .read_line(&mut response_line)
            .await
            .map_err(|e| SignseqError::IpcConnection {
                message: format!("Failed to read response: {}", e),
            })?;
        if read == 0 {
            return Err(SignseqError::IpcConnection {
                message: "Daemon closed the connection".to_string(),
            });
        }

        Response::from_json(response_line.trim()).map_err(|e| SignseqError::IpcProtocol {
            message: format!("Failed to deserialize response: {}", e),
        })
    }
}

/// Send a single request on a fresh connection.
///
/// The session opened for the connection is closed when this returns.
pub async fn send_request(socket_path: &Path, request: Request) -> Result<Response> {
    let mut client = SessionClient::connect(socket_path).await?;
    client.request(&request).await
}
