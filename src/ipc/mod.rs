//! IPC (Inter-Process Communication) via Unix sockets
//!
//! A second invocation of the program forwards its request to the running
//! instance. Uses length-prefixed JSON over a Unix domain socket.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use tracing::debug;

mod messages;
pub use messages::{SelectRequest, SelectResponse, StatusSnapshot};

use crate::constants::ipc::{MAX_MESSAGE_SIZE, SOCKET_DIR, SOCKET_NAME};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(SOCKET_DIR).join(SOCKET_NAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(SOCKET_DIR).join(SOCKET_NAME))
}

/// Client connection to the running instance
pub struct SelectClient {
    pub(crate) stream: UnixStream,
}

impl SelectClient {
    /// Connect to specific socket path
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to jack-select at {}", path.display()))?;
        Ok(Self { stream })
    }

    /// Send request and wait for response
    pub fn request(&mut self, req: &SelectRequest) -> Result<SelectResponse> {
        write_message(&mut self.stream, req)?;
        read_message(&mut self.stream)
    }

    /// Receive a request (server side of an accepted connection)
    pub fn recv_request(&mut self) -> Result<SelectRequest> {
        read_message(&mut self.stream)
    }

    /// Send a response (server side of an accepted connection)
    pub fn send_response(&mut self, resp: &SelectResponse) -> Result<()> {
        write_message(&mut self.stream, resp)
    }
}

/// Listener owned by the running instance
#[derive(Debug)]
pub struct SelectServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl SelectServer {
    /// Bind to a socket path
    ///
    /// A socket file nobody answers on is left over from a crashed instance
    /// and gets replaced. A live one is an error.
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .with_context(|| format!("Failed to restrict socket directory: {}", parent.display()))?;
        }

        match UnixStream::connect(&socket_path) {
            Ok(_) => bail!("jack-select is already listening on {}", socket_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(_) => {
                debug!(socket = %socket_path.display(), "Replacing stale socket");
                fs::remove_file(&socket_path).with_context(|| {
                    format!("Failed to remove stale socket: {}", socket_path.display())
                })?;
            }
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Wait for the next client (blocking)
    pub fn accept(&self) -> Result<SelectClient> {
        let (stream, _) = self.listener.accept()?;
        Ok(SelectClient { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for SelectServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.socket_path);
    }
}

/// One frame: u32 little-endian payload length, then the JSON payload
fn write_message<T: Serialize>(stream: &mut impl Write, msg: &T) -> Result<()> {
    let mut frame = vec![0u8; 4];
    serde_json::to_writer(&mut frame, msg).context("Failed to encode IPC message")?;

    let len = frame.len() - 4;
    if len > MAX_MESSAGE_SIZE {
        bail!("Outgoing message too large: {len} bytes (max: {MAX_MESSAGE_SIZE})");
    }
    frame[..4].copy_from_slice(&(len as u32).to_le_bytes());

    stream.write_all(&frame).context("Failed to write IPC message")?;
    stream.flush().context("Failed to flush IPC stream")
}

fn read_message<T: DeserializeOwned>(stream: &mut impl Read) -> Result<T> {
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .context("Failed to read message length")?;

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_MESSAGE_SIZE {
        bail!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE})");
    }

    let mut payload = Vec::with_capacity(len);
    stream
        .take(len as u64)
        .read_to_end(&mut payload)
        .context("Failed to read message payload")?;
    if payload.len() < len {
        bail!("Connection closed after {} of {len} payload bytes", payload.len());
    }

    serde_json::from_slice(&payload).context("Failed to decode IPC message")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_request_over_socket_pair() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut client = SelectClient { stream: a };
        let mut server_side = SelectClient { stream: b };

        let handle = std::thread::spawn(move || {
            let req = server_side.recv_request().unwrap();
            assert_eq!(req, SelectRequest::ActivatePreset("Studio".into()));
            server_side.send_response(&SelectResponse::Ready).unwrap();
        });

        let resp = client
            .request(&SelectRequest::ActivatePreset("Studio".into()))
            .unwrap();
        assert_eq!(resp, SelectResponse::Ready);
        handle.join().unwrap();
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_MESSAGE_SIZE as u32) + 1).to_le_bytes());
        let result: Result<SelectRequest> = read_message(&mut Cursor::new(buf));
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_truncated_message_fails() {
        let mut buf = Vec::new();
        write_message(&mut buf, &SelectRequest::GetStatus).unwrap();
        buf.truncate(buf.len() - 1);
        let result: Result<SelectRequest> = read_message(&mut Cursor::new(buf));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_binds_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jack-select.sock");

        let server = SelectServer::bind_to(path.clone()).unwrap();
        assert!(path.exists());
        assert!(SelectClient::connect_to(&path).is_ok());
        drop(server);
        assert!(!path.exists());
        assert!(SelectClient::connect_to(&path).is_err());
    }

    #[test]
    fn test_bind_replaces_stale_socket_but_not_live_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jack-select.sock");

        // Left behind by a crashed instance: the file exists, nobody listens
        drop(UnixListener::bind(&path).unwrap());
        assert!(path.exists());
        let server = SelectServer::bind_to(path.clone()).unwrap();

        let second = SelectServer::bind_to(path.clone());
        assert!(second.unwrap_err().to_string().contains("already listening"));
        drop(server);
    }

    #[test]
    fn test_oversized_outgoing_message_is_refused() {
        let mut buf = Vec::new();
        let huge = SelectRequest::ActivatePreset("x".repeat(MAX_MESSAGE_SIZE));
        assert!(write_message(&mut buf, &huge).is_err());
        assert!(buf.is_empty());
    }
}
