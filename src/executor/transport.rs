use async_trait::async_trait;
use thiserror::Error;

use super::models::{HttpCall, RawResponse};

/// Failure before any status line was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid HTTP method {0}")]
    InvalidMethod(String),
    #[error("{0}")]
    Network(String),
}

/// The HTTP capability the executor depends on.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, call: HttpCall) -> Result<RawResponse, TransportError>;
}

#[cfg(feature = "cli")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "cli")]
mod reqwest_transport {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{header::HeaderMap, Client, Method};

    use super::{HttpTransport, TransportError};
    use crate::curl::Headers;
    use crate::executor::models::{HttpCall, RawResponse};

    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
            let mut builder = Client::builder();
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            let client = builder
                .build()
                .map_err(|err| TransportError::Network(err.to_string()))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, call: HttpCall) -> Result<RawResponse, TransportError> {
            let method = Method::from_bytes(call.method.as_bytes())
                .map_err(|_| TransportError::InvalidMethod(call.method.clone()))?;
            let mut request_builder = self.client.request(method, &call.url);

            for (name, value) in &call.headers {
                request_builder = request_builder.header(name, value);
            }

            if let Some(body) = call.body {
                request_builder = request_builder.body(body);
            }

            let response = request_builder
                .send()
                .await
                .map_err(|err| TransportError::Network(err.to_string()))?;

            let status = response.status();
            let headers = collect_headers(response.headers());
            let body = response
                .text()
                .await
                .map_err(|err| TransportError::Network(err.to_string()))?;

            Ok(RawResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            })
        }
    }

    fn collect_headers(headers: &HeaderMap) -> Headers {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use httpmock::prelude::*;

        #[test]
        fn collect_headers_preserves_values() {
            let mut map = HeaderMap::new();
            map.insert("X-Test", "value".parse().unwrap());
            map.insert("content-type", "application/json".parse().unwrap());

            let headers = collect_headers(&map);
            assert_eq!(headers.get("x-test").map(String::as_str), Some("value"));
            assert_eq!(
                headers.get("content-type").map(String::as_str),
                Some("application/json")
            );
        }

        #[tokio::test]
        async fn send_forwards_method_headers_and_body() {
            let server = MockServer::start_async().await;
            let mock = server
                .mock_async(|when, then| {
                    when.method(POST)
                        .path("/widgets")
                        .header("x-trace", "abc")
                        .body("{\"name\":\"bolt\"}");
                    then.status(201)
                        .header("content-type", "application/json")
                        .body("{\"id\":1}");
                })
                .await;

            let transport = ReqwestTransport::default();
            let response = transport
                .send(HttpCall {
                    method: "POST".to_string(),
                    url: server.url("/widgets"),
                    headers: Headers::from([("X-Trace".to_string(), "abc".to_string())]),
                    body: Some("{\"name\":\"bolt\"}".to_string()),
                })
                .await
                .unwrap();

            assert_eq!(response.status, 201);
            assert_eq!(response.status_text, "Created");
            assert_eq!(response.body, "{\"id\":1}");
            mock.assert_async().await;
        }

        #[tokio::test]
        async fn send_rejects_invalid_methods() {
            let transport = ReqwestTransport::default();
            let err = transport
                .send(HttpCall {
                    method: "NOT A METHOD".to_string(),
                    url: "http://127.0.0.1:9".to_string(),
                    headers: Headers::new(),
                    body: None,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, TransportError::InvalidMethod(_)));
        }
    }
}
