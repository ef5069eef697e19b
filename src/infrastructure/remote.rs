//! Remote quote endpoint.
//!
//! A generic JSON HTTP resource: `GET` returns an array of records with a
//! `title`, `POST` accepts the local quotes and its response is ignored.
//! No timeout is set on either call.

use async_trait::async_trait;

use crate::domain::{Quote, RemoteRecord, SyncError};

/// Source of remote snapshots.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the current remote snapshot.
    async fn fetch_records(&self) -> Result<Vec<RemoteRecord>, SyncError>;

    /// Push the full local sequence.
    async fn push_quotes(&self, quotes: &[Quote]) -> Result<(), SyncError>;
}

/// `RemoteSource` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_records(&self) -> Result<Vec<RemoteRecord>, SyncError> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching remote quotes");

        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let records: Vec<RemoteRecord> =
            serde_json::from_slice(&body).map_err(|e| SyncError::Decode {
                message: e.to_string(),
            })?;

        tracing::debug!(count = records.len(), "Remote snapshot received");
        Ok(records)
    }

    async fn push_quotes(&self, quotes: &[Quote]) -> Result<(), SyncError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(quotes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }

        tracing::debug!(count = quotes.len(), status = status.as_u16(), "Local quotes pushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_records_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "title": "Be kind", "body": "..."},
                {"id": 2, "title": "New one"}
            ])))
            .mount(&mock_server)
            .await;

        let remote = HttpRemote::new(format!("{}/posts", mock_server.uri()));
        let records = remote.fetch_records().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "New one");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let remote = HttpRemote::new(mock_server.uri());
        let result = remote.fetch_records().await;

        assert!(matches!(result, Err(SyncError::HttpStatus(503))));
    }

    #[tokio::test]
    async fn test_fetch_non_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let remote = HttpRemote::new(mock_server.uri());
        let result = remote.fetch_records().await;

        assert!(matches!(result, Err(SyncError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_push_sends_quotes_as_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!([
                {"text": "Be kind", "category": "A"}
            ])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let remote = HttpRemote::new(mock_server.uri());
        let quotes = vec![Quote {
            text: "Be kind".into(),
            category: "A".into(),
        }];

        remote.push_quotes(&quotes).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let remote = HttpRemote::new("http://127.0.0.1:9/posts");
        let result = remote.fetch_records().await;
        assert!(matches!(result, Err(SyncError::Network(_))));
    }
}
