//! Blocking HTTP plumbing shared by the OpenAI and Ollama clients.
//!
//! Every logical operation is exactly one request: no retries, no pooling
//! guarantees beyond what `reqwest` does on its own. One [`HttpClient`] can
//! be used for any number of sequential requests.

use std::time::{Duration, Instant};

use reqwest::blocking::{multipart::Form, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::GptError;

const EMPTY_ERROR_MESSAGE: &str = "An error occurred but error message is empty";
const MALFORMED_ERROR_RESPONSE: &str = "Malformed error response. No error object could be found";

/// A typed view of a response together with the body it was parsed from.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub raw: String,
}

/// A reusable handle bound to one API base URL and (optionally) one token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Status, body and round-trip time of one exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub rtt: Duration,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GptError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GptError::Transport {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, GptError> {
        let url = self.url(path);
        let req = self.client.get(&url).query(query);
        self.execute(req, "GET", url)
    }

    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<RawResponse, GptError> {
        let url = self.url(path);
        let req = self.client.post(&url).json(body);
        self.execute(req, "POST", url)
    }

    pub fn post_form(&self, path: &str, form: Form) -> Result<RawResponse, GptError> {
        let url = self.url(path);
        let req = self.client.post(&url).multipart(form);
        self.execute(req, "POST", url)
    }

    pub fn delete(&self, path: &str) -> Result<RawResponse, GptError> {
        let url = self.url(path);
        let req = self.client.delete(&url);
        self.execute(req, "DELETE", url)
    }

    fn execute(
        &self,
        mut req: RequestBuilder,
        method: &str,
        url: String,
    ) -> Result<RawResponse, GptError> {
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::debug!(method, url = %url, "sending request");
        let start = Instant::now();

        let response = req.send().map_err(|e| GptError::Transport {
            url: url.clone(),
            reason: root_cause(&e),
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| GptError::Transport {
            url: url.clone(),
            reason: root_cause(&e),
        })?;

        let rtt = start.elapsed();
        tracing::debug!(status, rtt = rtt.as_secs_f32(), "received response");

        Ok(RawResponse { status, body, rtt })
    }
}

/// The innermost error in the chain is usually the useful one
/// (e.g. "Connection refused" rather than "error sending request").
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body, turning provider error envelopes into errors.
    pub fn json(&self) -> Result<Value, GptError> {
        if !self.is_success() {
            return Err(self.api_error());
        }

        let json = parse_json(&self.body)?;
        if let Some(message) = error_message(&json) {
            return Err(GptError::Embedded {
                message,
                raw: self.body.clone(),
            });
        }
        Ok(json)
    }

    /// Parse the body into `T` after checking for error envelopes.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, GptError> {
        let json = self.json()?;
        serde_json::from_value(json).map_err(|e| GptError::Unpack(e.to_string()))
    }

    /// Like [`RawResponse::parse`] but keeps the body for `--json` output.
    pub fn parsed<T: DeserializeOwned>(self) -> Result<Parsed<T>, GptError> {
        let value = self.parse()?;
        Ok(Parsed {
            value,
            raw: self.body,
        })
    }

    fn api_error(&self) -> GptError {
        let message = serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|json| error_message(&json))
            .unwrap_or_else(|| MALFORMED_ERROR_RESPONSE.to_string());

        tracing::debug!(status = self.status, body = %self.body, "provider returned an error");
        GptError::Api {
            status: self.status,
            message,
        }
    }
}

pub fn parse_json(body: &str) -> Result<Value, GptError> {
    serde_json::from_str(body).map_err(|e| GptError::Parse(e.to_string()))
}

/// Extract the message of an error envelope.
///
/// OpenAI nests it (`{"error": {"message": ...}}`), Ollama does not
/// (`{"error": "..."}`). A null or empty `error` is not an error.
pub fn error_message(json: &Value) -> Option<String> {
    match json.get("error")? {
        Value::Object(obj) if !obj.is_empty() => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(EMPTY_ERROR_MESSAGE)
                .to_string(),
        ),
        Value::String(msg) if !msg.is_empty() => Some(msg.clone()),
        _ => None,
    }
}
