use crate::domain::model::HttpResponse;
use crate::domain::ports::Transport;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { attempts: 1 }
    } else if err.is_connect() {
        FetchError::Connection(err.to_string())
    } else {
        FetchError::Request(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/users/");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(r#"[{"id":1}]"#);
        });

        let transport = ReqwestTransport::new();
        let response = transport
            .get(&server.url("/users/"), Duration::from_secs(5))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/");
            then.status(404).body("Not Found");
        });

        let transport = ReqwestTransport::new();
        let response = transport
            .get(&server.url("/users/"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500)).body("[]");
        });

        let transport = ReqwestTransport::new();
        let err = transport
            .get(&server.url("/slow"), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Timeout { attempts: 1 });
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let transport = ReqwestTransport::new();
        let err = transport
            .get("http://127.0.0.1:1/users/", Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Connection(_)));
    }
}
