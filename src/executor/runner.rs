use std::{sync::Arc, time::Instant};

use tracing::{info, warn};

use crate::curl::{Headers, Request};

use super::{
    models::{HttpCall, ResponseEnvelope},
    transport::HttpTransport,
};

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Runs parsed requests through an [`HttpTransport`] and folds every outcome
/// into a [`ResponseEnvelope`].
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Never fails: transport errors come back as a status 0 envelope, HTTP
    /// error statuses as a regular envelope with `ok == false`.
    pub async fn execute(&self, request: &Request, override_token: Option<&str>) -> ResponseEnvelope {
        let call = build_call(request, override_token);
        let start = Instant::now();
        let outcome = self.transport.send(call).await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(raw) => {
                info!(
                    method = %request.method,
                    url = %request.url,
                    status = raw.status,
                    duration_ms,
                    "request completed"
                );
                ResponseEnvelope::from_raw(raw, duration_ms)
            }
            Err(err) => {
                warn!(method = %request.method, url = %request.url, error = %err, "request failed");
                ResponseEnvelope::transport_failure(err.to_string(), duration_ms)
            }
        }
    }
}

pub(crate) fn build_call(request: &Request, override_token: Option<&str>) -> HttpCall {
    HttpCall {
        method: request.method.clone(),
        url: request.url.clone(),
        headers: merge_headers(&request.headers, override_token),
        body: request
            .carries_payload()
            .then(|| request.payload.clone()),
    }
}

fn merge_headers(request_headers: &Headers, override_token: Option<&str>) -> Headers {
    let mut headers = Headers::new();
    if !request_headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE))
    {
        headers.insert(CONTENT_TYPE.to_string(), DEFAULT_CONTENT_TYPE.to_string());
    }
    headers.extend(request_headers.clone());

    if let Some(token) = override_token.filter(|token| !token.is_empty()) {
        headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
        headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
    }

    headers
}
