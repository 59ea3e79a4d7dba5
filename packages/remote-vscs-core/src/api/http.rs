//! Minimal static asset responder.
//!
//! Serves the bootstrap page for `/` and whitelisted files from the asset
//! directory over HTTP/1.0: one request per connection, no keep-alive, `GET`
//! only. Anything it does not understand is either dropped
//! silently (malformed request) or answered with an empty `404`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, BridgeResult};
use crate::protocol_constants::HTTP_MIN_REQUEST_BYTES;
use crate::state::Config;
use crate::utils::{content_type_for, resolve_asset_path};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Assembles a complete HTTP/1.0 response.
///
/// `Content-Length` is the exact body length and nothing follows the body.
pub fn build_response(status: &str, content_type: Option<&str>, body: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(128 + body.len());
    buf.put_slice(b"HTTP/1.0 ");
    buf.put_slice(status.as_bytes());
    buf.put_slice(b"\r\nConnection: close\r\n");
    if let Some(content_type) = content_type {
        buf.put_slice(b"Content-Type: ");
        buf.put_slice(content_type.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
    buf.put_slice(body);
    buf.freeze()
}

/// Extracts the request target from a raw `GET` request.
///
/// Returns `None` for anything that should be dropped without a reply:
/// fewer than three bytes, a method other than `GET`, or no target.
pub fn parse_request_target(request: &[u8]) -> Option<&str> {
    if request.len() < HTTP_MIN_REQUEST_BYTES || !request.starts_with(b"GET ") {
        return None;
    }
    let line_end = request
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(request.len());
    let line = std::str::from_utf8(&request[..line_end]).ok()?;
    line.split_ascii_whitespace().nth(1)
}

/// Answers static asset requests.
///
/// The bootstrap page and the 404 response are built once; other assets are
/// read from disk on every request so edits show up without a restart.
pub struct StaticResponder {
    asset_dir: PathBuf,
    bootstrap: Bytes,
    not_found: Bytes,
    read_timeout: Duration,
    write_timeout: Duration,
    linger: Duration,
    max_request_bytes: usize,
}

impl StaticResponder {
    /// Loads the bootstrap document and prebuilds the fixed responses.
    pub fn load(config: &Config) -> BridgeResult<Self> {
        let path = config.bootstrap_path();
        let page = std::fs::read(&path).map_err(|e| {
            BridgeError::Configuration(format!(
                "cannot read bootstrap document {}: {}",
                path.display(),
                e
            ))
        })?;
        log::info!(
            "[HTTP] Loaded bootstrap document {} ({} bytes)",
            path.display(),
            page.len()
        );
        Ok(Self::with_bootstrap(config, &page))
    }

    /// Builds a responder around an in-memory bootstrap page.
    pub fn with_bootstrap(config: &Config, page: &[u8]) -> Self {
        Self {
            asset_dir: config.asset_dir.clone(),
            bootstrap: build_response("200 OK", Some(content_type_for("html")), page),
            not_found: build_response("404 Not Found", None, &[]),
            read_timeout: Duration::from_millis(config.http_read_timeout_ms),
            write_timeout: Duration::from_millis(config.http_write_timeout_ms),
            linger: Duration::from_millis(config.http_linger_ms),
            max_request_bytes: config.http_max_request_bytes,
        }
    }

    /// Response for a request target.
    pub async fn respond(&self, target: &str) -> Bytes {
        if target == "/" {
            return self.bootstrap.clone();
        }
        let asset = match resolve_asset_path(&self.asset_dir, target) {
            Ok(asset) => asset,
            Err(e) => {
                log::debug!("[HTTP] 404 {}: {}", target, e);
                return self.not_found.clone();
            }
        };
        match tokio::fs::metadata(&asset.path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                log::debug!("[HTTP] 404 {}: no such file", target);
                return self.not_found.clone();
            }
        }
        match tokio::fs::read(&asset.path).await {
            Ok(body) => build_response(
                "200 OK",
                Some(content_type_for(&asset.extension)),
                &body,
            ),
            Err(e) => {
                log::warn!("[HTTP] Failed to read {}: {}", asset.path.display(), e);
                self.not_found.clone()
            }
        }
    }

    /// Serves one connection: one read, at most one write, then close.
    async fn handle_connection(&self, mut stream: TcpStream) {
        let mut buf = vec![0u8; self.max_request_bytes];
        let len = match tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => {
                log::debug!("[HTTP] Read failed: {}", e);
                return;
            }
            Err(_) => {
                log::debug!("[HTTP] Read timed out");
                return;
            }
        };

        let Some(target) = parse_request_target(&buf[..len]) else {
            log::trace!("[HTTP] Dropping malformed request ({} bytes)", len);
            self.close(stream).await;
            return;
        };
        let response = self.respond(target).await;

        match tokio::time::timeout(self.write_timeout, stream.write_all(&response)).await {
            Ok(Ok(())) => self.close(stream).await,
            Ok(Err(e)) => log::debug!("[HTTP] Write failed: {}", e),
            Err(_) => log::debug!("[HTTP] Write timed out"),
        }
    }

    /// Graceful close: send FIN, then discard whatever the peer still sends
    /// until it closes or the linger period ends.
    ///
    /// Dropping a socket with unread input makes the kernel reset the
    /// connection and discard queued output, so input is drained first.
    async fn close(&self, mut stream: TcpStream) {
        if let Err(e) = stream.shutdown().await {
            log::debug!("[HTTP] Shutdown failed: {}", e);
            return;
        }
        let drain = async {
            let mut scratch = [0u8; 512];
            while let Ok(n) = stream.read(&mut scratch).await {
                if n == 0 {
                    break;
                }
            }
        };
        if tokio::time::timeout(self.linger, drain).await.is_err() {
            log::trace!("[HTTP] Peer still open after linger, closing");
        }
    }
}

/// Accept loop. Each connection is served on its own task; errors on one
/// connection never stop the loop. Returns when `cancel` fires.
pub async fn serve(listener: TcpListener, responder: Arc<StaticResponder>, cancel: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                log::trace!("[HTTP] Connection from {}", peer);
                let responder = Arc::clone(&responder);
                tokio::spawn(async move {
                    responder.handle_connection(stream).await;
                });
            }
            Err(e) => {
                log::warn!("[HTTP] Accept failed: {}", e);
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
    log::info!("[HTTP] Listener stopped");
}
