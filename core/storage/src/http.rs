//! HTTP remote source.

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use std::time::Duration;
use tracing::debug;
use url::Url;

use dropweb_common::{Error, Result};

use crate::provider::{RemoteResponse, RemoteSource};

/// Default bound on a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote source reached over HTTP(S).
pub struct HttpRemote {
    http: Client,
    timeout: Duration,
}

impl HttpRemote {
    /// Create a new HTTP remote with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP remote whose requests give up after `timeout`.
    ///
    /// # Errors
    /// - Returns error if the HTTP client cannot be built
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("dropweb/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    /// Send one request and collect status, validator and body.
    async fn send(&self, method: Method, url: &str) -> Result<RemoteResponse> {
        let url = Url::parse(url)
            .map_err(|e| Error::InvalidInput(format!("Invalid URL {}: {}", url, e)))?;

        debug!("{} {}", method, url);

        let response = self
            .http
            .request(method.clone(), url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = if method == Method::HEAD {
            Vec::new()
        } else {
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| self.map_error(e))?
        };

        Ok(RemoteResponse { status, etag, body })
    }

    fn map_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    async fn probe(&self, url: &str) -> Result<RemoteResponse> {
        self.send(Method::HEAD, url).await
    }

    async fn fetch(&self, url: &str) -> Result<RemoteResponse> {
        self.send(Method::GET, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::ETAG;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn diary() -> impl IntoResponse {
        ([(ETAG, "\"v1\"")], "title: Diary\n\nhello")
    }

    async fn slow() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "late"
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/diary.txt", get(diary))
            .route("/slow.txt", get(slow));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_reads_body_and_etag() {
        let base = serve().await;
        let remote = HttpRemote::new().unwrap();

        let response = remote.fetch(&format!("{}/diary.txt", base)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.etag.as_deref(), Some("\"v1\""));
        assert_eq!(response.body, b"title: Diary\n\nhello");
    }

    #[tokio::test]
    async fn test_probe_has_no_body() {
        let base = serve().await;
        let remote = HttpRemote::new().unwrap();

        let response = remote.probe(&format!("{}/diary.txt", base)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.etag.as_deref(), Some("\"v1\""));
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_document_status() {
        let base = serve().await;
        let remote = HttpRemote::new().unwrap();

        let response = remote.fetch(&format!("{}/nope.txt", base)).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_timeout() {
        let base = serve().await;
        let remote = HttpRemote::with_timeout(Duration::from_millis(100)).unwrap();

        let err = remote.fetch(&format!("{}/slow.txt", base)).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let remote = HttpRemote::new().unwrap();
        let err = remote.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
