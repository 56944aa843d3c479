use std::sync::Mutex;

use async_trait::async_trait;

use super::{HttpCall, HttpTransport, RawResponse, TransportError};
use crate::curl::Headers;

/// Records every call and answers from a fixed script keyed by URL.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub calls: Mutex<Vec<HttpCall>>,
    pub responses: Vec<(String, Result<RawResponse, String>)>,
}

impl ScriptedTransport {
    pub fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.push((
            url.to_string(),
            Ok(RawResponse {
                status,
                status_text: "Scripted".to_string(),
                headers: Headers::new(),
                body: body.to_string(),
            }),
        ));
        self
    }

    pub fn fail(mut self, url: &str, message: &str) -> Self {
        self.responses.push((url.to_string(), Err(message.to_string())));
        self
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, call: HttpCall) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(call.clone());
        match self.responses.iter().find(|(url, _)| *url == call.url) {
            Some((_, Ok(raw))) => Ok(raw.clone()),
            Some((_, Err(message))) => Err(TransportError::Network(message.clone())),
            None => Err(TransportError::Network(format!("no route to {}", call.url))),
        }
    }
}
