//! Async Unix socket server. One connection is one segmentation session.

use crate::error::{Result, SignseqError};
use crate::ipc::protocol::{Request, Response};
use crate::session::SessionId;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

/// Handler trait for processing session requests.
#[async_trait::async_trait]
pub trait SessionHandler: Send + Sync {
    /// Called when a client connects.
    async fn open_session(&self) -> Result<SessionId>;

    /// Handle one request observed at `timestamp`.
    async fn handle(&self, session: SessionId, request: Request, timestamp: Instant) -> Response;

    /// Called when the client disconnects.
    async fn close_session(&self, session: SessionId);
}

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// IPC server streaming frames from capture clients via Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    state: ServerState,
}

impl IpcServer {
    /// Create a new IPC server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        Ok(Self {
            socket_path,
            state: ServerState::new(),
        })
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("signseq.sock")
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/signseq-{}.sock", uid))
        }
    }

    /// Start the IPC server and handle incoming connections.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: SessionHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| SignseqError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| SignseqError::IpcSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;

        let handler = Arc::new(handler);

        loop {
            if self.state.is_shutdown().await {
                break;
            }

            // Accept connection with timeout to check for shutdown
            let accept_result =
                tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, handler).await {
                            warn!("Error handling client: {}", e);
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(SignseqError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the IPC server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| SignseqError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Serve one client for the lifetime of its connection.
async fn handle_client<H>(stream: UnixStream, handler: Arc<H>) -> Result<()>
where
    H: SessionHandler,
{
    let session = handler.open_session().await?;
    let result = serve_session(stream, handler.as_ref(), session).await;
    handler.close_session(session).await;
    result
}

async fn serve_session<H>(stream: UnixStream, handler: &H, session: SessionId) -> Result<()>
where
    H: SessionHandler + ?Sized,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    let origin = Instant::now();

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| SignseqError::IpcConnection {
                message: format!("Failed to read from client: {}", e),
            })?;
        if read == 0 {
            debug!("Session {} disconnected", session);
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // A frame that cannot be decoded still ticks the clock as "no hand".
        let request = Request::from_json(trimmed).unwrap_or_else(|e| {
            warn!("Session {}: undecodable request treated as no_hand: {}", session, e);
            Request::NoHand { offset_ms: None }
        });

        let timestamp = match request.offset_ms() {
            Some(ms) => origin + Duration::from_millis(ms),
            None => Instant::now(),
        };

        let response = handler.handle(session, request, timestamp).await;
        write_response(&mut writer, &response).await?;
    }
}

async fn write_response(writer: &mut OwnedWriteHalf, response: &Response) -> Result<()> {
    let response_json = response.to_json().map_err(|e| SignseqError::IpcProtocol {
        message: format!("Failed to serialize response: {}", e),
    })?;

    writer
        .write_all(response_json.as_bytes())
        .await
        .map_err(|e| SignseqError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;

    writer
        .write_all(b"\n")
        .await
        .map_err(|e| SignseqError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;

    writer
        .flush()
        .await
        .map_err(|e| SignseqError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::OutputEvent;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use tempfile::TempDir;

    // Echoes the session id and request kind back as the display label.
    #[derive(Default)]
    struct EchoHandler {
        next: AtomicU64,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SessionHandler for EchoHandler {
        async fn open_session(&self) -> Result<SessionId> {
            Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn handle(&self, session: SessionId, request: Request, _: Instant) -> Response {
            let kind = match request {
                Request::Features { .. } => "features",
                Request::Observation { .. } => "observation",
                Request::NoHand { .. } => "no_hand",
                Request::Clip { .. } => "clip",
                Request::Status => {
                    return Response::Status {
                        sessions: 1,
                        classifier: "echo".to_string(),
                        labels: 0,
                    };
                }
            };
            Response::Event(OutputEvent {
                display_label: format!("{}:{}", session, kind),
                confidence: 0.0,
                sequence: Vec::new(),
                sequence_complete: false,
                transition: None,
            })
        }

        async fn close_session(&self, _session: SessionId) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn start_server(handler: EchoHandler) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let server_socket_path = socket_path.clone();
        tokio::spawn(async move {
            let server = IpcServer::new(server_socket_path).unwrap();
            server.start(handler).await
        });

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(50)).await;
        (temp_dir, socket_path)
    }

    async fn exchange(
        reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>,
        writer: &mut OwnedWriteHalf,
        line: &str,
    ) -> Response {
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        let mut response = String::new();
        reader.read_line(&mut response).await.unwrap();
        Response::from_json(response.trim()).unwrap()
    }

    fn label(response: Response) -> String {
        match response {
            Response::Event(event) => event.display_label,
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    #[test]
    fn test_default_socket_path_returns_valid_path() {
        let path = IpcServer::default_socket_path();
        let path_str = path.to_string_lossy();
        if std::env::var("XDG_RUNTIME_DIR").is_ok() {
            assert!(
                path_str.ends_with("signseq.sock"),
                "With XDG_RUNTIME_DIR, expected path ending with signseq.sock, got: {:?}",
                path
            );
        } else {
            let uid = unsafe { libc::getuid() };
            assert_eq!(path_str, format!("/tmp/signseq-{}.sock", uid));
        }
    }

    #[tokio::test]
    async fn test_server_binds_to_socket() {
        let (_dir, socket_path) = start_server(EchoHandler::default()).await;
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_connection_streams_many_frames() {
        let (_dir, socket_path) = start_server(EchoHandler::default()).await;
        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let first = exchange(&mut reader, &mut writer, r#"{"type":"no_hand"}"#).await;
        let second = exchange(
            &mut reader,
            &mut writer,
            r#"{"type":"observation","label":"a","confidence":0.9}"#,
        )
        .await;

        assert_eq!(label(first), "1:no_hand");
        assert_eq!(label(second), "1:observation");
    }

    #[tokio::test]
    async fn test_each_connection_gets_its_own_session() {
        let (_dir, socket_path) = start_server(EchoHandler::default()).await;

        let mut labels = Vec::new();
        for _ in 0..2 {
            let stream = UnixStream::connect(&socket_path).await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            labels.push(label(
                exchange(&mut reader, &mut writer, r#"{"type":"no_hand"}"#).await,
            ));
        }

        assert_ne!(labels[0], labels[1]);
    }

    #[tokio::test]
    async fn test_undecodable_line_is_no_hand() {
        let (_dir, socket_path) = start_server(EchoHandler::default()).await;
        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let response = exchange(&mut reader, &mut writer, "not valid json").await;
        assert!(label(response).ends_with(":no_hand"));

        // Connection stays usable afterwards.
        let response = exchange(&mut reader, &mut writer, r#"{"type":"status"}"#).await;
        assert!(matches!(response, Response::Status { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_closes_session() {
        let handler = EchoHandler::default();
        let closed = Arc::clone(&handler.closed);
        let (_dir, socket_path) = start_server(handler).await;

        {
            let stream = UnixStream::connect(&socket_path).await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            exchange(&mut reader, &mut writer, r#"{"type":"no_hand"}"#).await;
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_removes_socket() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");
        let server = Arc::new(IpcServer::new(socket_path.clone()).unwrap());

        let running = Arc::clone(&server);
        let task = tokio::spawn(async move { running.start(EchoHandler::default()).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(socket_path.exists());

        server.stop().await.unwrap();
        let result = tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(!socket_path.exists());
    }
}
