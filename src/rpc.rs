use crate::config::AppConfig;
use crate::utils::find_char_boundary;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

// ── Wire envelope ───────────────────────────────────────────────────────

/// Request envelope: positional params, `id` always the literal null.
#[derive(Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: Vec<Value>,
    id: Value,
}

impl<'a> RpcRequest<'a> {
    fn new(method: &'a str, params: Vec<Value>) -> Self {
        Self {
            method,
            params,
            id: Value::Null,
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Server-side failure reported inside the response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One batch of interpreter output, as returned by the `output` method.
///
/// `result` is newline-joined text; empty means "no new output yet".
/// `error` selects traceback styling for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputBatch {
    pub result: String,
    pub error: bool,
}

// ── Client ──────────────────────────────────────────────────────────────

/// JSON RPC client for the remote execution service.
///
/// All calls POST to one fixed endpoint. Network errors, HTTP 429 and
/// 5xx are retried with exponential backoff plus jitter up to
/// `max_retries`; other failures fail fast.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    max_retries: u32,
}

impl RpcClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.server_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request a new session identifier. Called once at startup; a
    /// failure here leaves the console unusable.
    pub async fn start_session(&self) -> Result<String> {
        let result = self.call("start_session", vec![]).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("start_session returned a non-string session id: {result}"))
    }

    /// Submit a statement for execution. Fire-and-forget: the HTTP
    /// response carries no execution output — results arrive
    /// asynchronously through [`RpcClient::output`].
    pub async fn exec(&self, session_id: &str, code: &str) -> Result<()> {
        self.call("exec", vec![json!(session_id), json!(code)])
            .await?;
        Ok(())
    }

    /// Pull the next batch of interpreter output for this session.
    pub async fn output(&self, session_id: &str) -> Result<OutputBatch> {
        let result = self.call("output", vec![json!(session_id)]).await?;
        serde_json::from_value(result).context("Malformed output batch from server")
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let body = RpcRequest::new(method, params);

        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let base_delay = Duration::from_secs(1u64 << (attempt - 1)); // 1s, 2s, 4s, ...
                let jitter = Duration::from_millis(rand::random::<u64>() % 500);
                tokio::time::sleep(base_delay + jitter).await;
            }

            let result = self
                .http
                .post(&self.url)
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await;

            let resp = match result {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(anyhow!("HTTP error calling {} at {}: {}", method, self.url, e));
                    continue; // network error → retry
                }
            };

            let status = resp.status();
            let text_body = resp.text().await.context("Failed to read server response")?;

            if status.is_success() {
                let parsed: RpcResponse = serde_json::from_str(&text_body).with_context(|| {
                    format!(
                        "Failed to parse response for {}. Raw body:\n{}",
                        method,
                        &text_body[..find_char_boundary(&text_body, 500)]
                    )
                })?;

                if let Some(err) = parsed.error {
                    return Err(anyhow!(
                        "Server error from {}: {} ({})",
                        method,
                        err.msg,
                        err.kind
                    ));
                }

                return Ok(parsed.result.unwrap_or(Value::Null));
            }

            // Decide whether to retry based on status code
            let code = status.as_u16();
            if code == 429 || (500..600).contains(&code) {
                last_err = Some(anyhow!("Server error {} from {}: {}", status, method, text_body));
                continue;
            }

            // Client errors (400, 404, etc.) — fail fast
            return Err(anyhow!("Request {} failed with {}: {}", method, status, text_body));
        }

        Err(last_err.unwrap_or_else(|| anyhow!("All retry attempts exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let req = RpcRequest::new("start_session", vec![]);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"method":"start_session","params":[],"id":null}"#);
    }

    #[test]
    fn test_request_params_are_positional() {
        let req = RpcRequest::new("exec", vec![json!("web"), json!("x = 1\n")]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""params":["web","x = 1\n"]"#));
        assert!(json.contains(r#""id":null"#));
    }

    #[test]
    fn test_string_payload_escaping() {
        // Backslash, quote, form feed, backspace, newline, tab, CR all
        // need escaping before they hit the wire.
        let code = "print(\"a\\b\")\u{0c}\u{08}\n\t\r";
        let req = RpcRequest::new("exec", vec![json!("web"), json!(code)]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#"print(\"a\\b\")"#));
        assert!(json.contains("\\f"));
        assert!(json.contains("\\b"));
        assert!(json.contains("\\n"));
        assert!(json.contains("\\t"));
        assert!(json.contains("\\r"));
    }

    #[test]
    fn test_output_batch_deserialization() {
        let batch: OutputBatch =
            serde_json::from_str(r#"{"result": "4\nhello\n", "error": false}"#).unwrap();
        assert_eq!(batch.result, "4\nhello\n");
        assert!(!batch.error);
    }

    #[test]
    fn test_response_envelope_with_error() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"id": null, "result": null, "error": {"msg": "boom", "type": "RuntimeError"}}"#,
        )
        .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.msg, "boom");
        assert_eq!(err.kind, "RuntimeError");
    }

    #[test]
    fn test_response_envelope_success() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"id": null, "result": "web", "error": null}"#).unwrap();
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap(), json!("web"));
    }
}
