//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::{ForumError, Result};

use super::router::create_router;
use super::state::AppState;

/// Interval of the session and rate limiter cleanup task.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// HTTP server for the forum.
pub struct WebServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a server listening on `[server] host:port`.
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let server = &state.config.server;
        let addr = format!("{}:{}", server.host, server.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                ForumError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    server.host, server.port
                ))
            })?;

        Ok(Self { addr, state })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Periodically drop expired sessions and idle rate limiters.
    fn start_cleanup_task(state: Arc<AppState>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let removed = state.sessions.lock().await.cleanup();
                state.rate_limit.cleanup();

                if removed > 0 {
                    tracing::info!(removed, "Cleaned up expired sessions");
                } else {
                    tracing::debug!("No expired sessions to clean up");
                }
            }
        });
    }

    async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_cleanup_task(self.state.clone());
        tracing::info!("Session cleanup task started (runs every hour)");
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, local_addr))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, _) = self.bind().await?;
        let router = create_router(self.state);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, local_addr) = self.bind().await?;
        let router = create_router(self.state);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use crate::i18n::I18n;
    use crate::mail::MemoryMailer;
    use crate::template::TemplateEngine;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn test_state(host: &str, port: u16) -> Arc<AppState> {
        let mut config = Config::default();
        config.server.host = host.to_string();
        config.server.port = port;
        config.server.secret_key = "test-secret-key".to_string();
        config.server.serve_static = false;

        Arc::new(AppState::new(
            Arc::new(config),
            Database::open_in_memory().await.unwrap(),
            Arc::new(TemplateEngine::new()),
            Arc::new(I18n::default()),
            Arc::new(MemoryMailer::new()),
        ))
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let server = WebServer::new(test_state("127.0.0.1", 8000).await).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert_eq!(server.addr().port(), 8000);
    }

    #[tokio::test]
    async fn test_web_server_invalid_host() {
        let result = WebServer::new(test_state("not a host", 8000).await);
        assert!(matches!(result, Err(ForumError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let server = WebServer::new(test_state("127.0.0.1", 0).await).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 200"));
        if head.to_ascii_lowercase().contains("transfer-encoding: chunked") {
            assert_eq!(decode_chunked(body), "OK");
        } else {
            assert_eq!(body, "OK");
        }
    }

    fn decode_chunked(mut body: &str) -> String {
        let mut decoded = String::new();
        loop {
            let (size, rest) = body.split_once("\r\n").unwrap();
            let size = usize::from_str_radix(size.trim(), 16).unwrap();
            if size == 0 {
                return decoded;
            }
            decoded.push_str(&rest[..size]);
            body = &rest[size + 2..];
        }
    }
}
