//! Production run source: the simulator's HTTP API.
//!
//! - `POST {base}/run/{username}` with the source code as the raw body
//!   answers with the `{history, score}` payload, or 400 with the reason
//! - `GET {base}/leaderboard/{n}` answers with a JSON array of entries

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use crate::error::EnvError;
use crate::source::RunSource;
use crate::types::RunRequest;

/// Default per-request timeout. Simulating a full run can take a while.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `RunSource` talking to a live simulator over HTTP.
pub struct HttpRunSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRunSource {
    /// Creates a source for the server at `base_url`, e.g. `http://host:8000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EnvError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EnvError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("replay-env/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnvError::network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn run_url(&self, username: &str) -> String {
        format!("{}/run/{}", self.base_url, urlencoding::encode(username))
    }

    fn leaderboard_url(&self, n: usize) -> String {
        format!("{}/leaderboard/{}", self.base_url, n)
    }

    fn map_error(&self, e: reqwest::Error) -> EnvError {
        if e.is_timeout() {
            EnvError::Timeout(self.timeout.as_millis() as u64)
        } else {
            EnvError::network(e.to_string())
        }
    }

    /// Reads the body, turning non-success statuses into errors.
    async fn read(&self, response: reqwest::Response) -> Result<String, EnvError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Err(EnvError::Rejected(body)),
            s => Err(EnvError::network(format!("HTTP {}: {}", s.as_u16(), body))),
        }
    }
}

#[async_trait]
impl RunSource for HttpRunSource {
    async fn submit(&self, request: RunRequest) -> Result<String, EnvError> {
        let response = self
            .client
            .post(self.run_url(&request.username))
            .body(request.source_code)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        self.read(response).await
    }

    async fn leaderboard(&self, n: usize) -> Result<String, EnvError> {
        let response = self
            .client
            .get(self.leaderboard_url(n))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        self.read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response; the task yields the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });

        (format!("http://{}", addr), handle)
    }

    /// Reads headers plus `Content-Length` bytes of body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if data.len() >= split + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    #[test]
    fn test_urls() {
        let src = HttpRunSource::new("http://localhost:8000/").unwrap();
        assert_eq!(src.base_url(), "http://localhost:8000");
        assert_eq!(src.run_url("alice"), "http://localhost:8000/run/alice");
        assert_eq!(src.run_url("a b/c"), "http://localhost:8000/run/a%20b%2Fc");
        assert_eq!(src.run_url("zoë?"), "http://localhost:8000/run/zo%C3%AB%3F");
        assert_eq!(src.leaderboard_url(10), "http://localhost:8000/leaderboard/10");
    }

    #[tokio::test]
    async fn test_submit_posts_source_as_body() {
        let (url, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let src = HttpRunSource::new(url).unwrap();

        let body = src.submit(RunRequest::new("alice", "steer(1)")).await.unwrap();
        assert_eq!(body, r#"{"ok":true}"#);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /run/alice "));
        assert!(raw.ends_with("steer(1)"));
    }

    #[tokio::test]
    async fn test_bad_request_is_rejection() {
        let (url, _server) = serve_once("400 Bad Request", "unexpected token").await;
        let src = HttpRunSource::new(url).unwrap();

        let err = src.submit(RunRequest::new("bob", "steer(")).await.unwrap_err();
        assert!(matches!(err, EnvError::Rejected(ref msg) if msg == "unexpected token"));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let (url, _server) = serve_once("500 Internal Server Error", "boom").await;
        let src = HttpRunSource::new(url).unwrap();

        let err = src.leaderboard(5).await.unwrap_err();
        assert!(matches!(err, EnvError::Network(_)));
    }
}
