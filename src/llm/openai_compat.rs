//! Self-hosted backend adapter for OpenAI-compatible HTTP APIs
//! (Ollama, LM Studio, vLLM, llama.cpp server...).
//!
//! Every operation is a `POST {baseUrl}/chat/completions` with a
//! system/user message pair and a JSON-object response-format hint. This
//! is the only adapter with a local deadline: each request carries a
//! timeout that aborts the in-flight call and classifies as
//! [`AiError::Timeout`] on expiry. The hosted adapter intentionally has no
//! counterpart; its transport owns its own deadline.
//!
//! Also home of the connectivity probe the settings flow uses: it tries
//! `GET {baseUrl}/models` as entered and, on failure, retries with a `/v1`
//! suffix, reporting whichever URL worked as the canonical one.

use crate::llm::provider::AiProvider;
use crate::llm::types::{
    AiError, ContextualHelpResult, CorrectionResult, Explanation, FormattedCode,
};
use crate::markdown;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Per-request deadline. On expiry the request is aborted, not just
/// abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for the lightweight `/models` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenAI-compatible implementation of [`AiProvider`].
#[derive(Debug)]
pub struct OpenAiCompatibleProvider {
    model: String,
    base_url: String,
    api_key: Option<String>,
    origin: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        model: String,
        base_url: String,
        api_key: Option<String>,
        origin: Option<String>,
    ) -> Result<Self, AiError> {
        if base_url.trim().is_empty() || model.trim().is_empty() {
            return Err(AiError::InvalidConfig(
                "openai-compatible: Base URL and Model Name are required.".to_string(),
            ));
        }
        Ok(Self {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            origin,
            timeout: REQUEST_TIMEOUT,
            client: reqwest::Client::new(),
        })
    }

    /// Override the request deadline. Used by tests; production callers
    /// keep the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute_json_command<T: DeserializeOwned>(
        &self,
        system_prompt: &str,
        prompt: String,
        context: &str,
    ) -> Result<T, AiError> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, model = %self.model, base_url = %self.base_url, context,
            "sending chat completion request");

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.1,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            self.classify_send_error(&e, context)
        })?;

        let status = response.status();
        let payload = response.text().await.map_err(|e| {
            self.classify_send_error(&e, context)
        })?;

        if !status.is_success() {
            warn!(%request_id, %status, context, "chat completion request failed");
            return Err(classify_http_failure(
                status,
                &payload,
                &self.base_url,
                &self.model,
                context,
            ));
        }

        let content = extract_chat_content(&payload).ok_or_else(|| {
            AiError::MalformedResponse(format!(
                "The server at {} returned an empty response while fetching {context}. Retrying may help.",
                self.base_url
            ))
        })?;

        let parsable = markdown::unwrap_json_fence(&content);
        serde_json::from_str(parsable).map_err(|e| {
            AiError::MalformedResponse(format!(
                "Could not parse the response for {context} as the expected JSON shape: {e}. Retrying may help."
            ))
        })
    }

    fn classify_send_error(&self, error: &reqwest::Error, context: &str) -> AiError {
        if error.is_timeout() {
            return AiError::Timeout(format!(
                "The request to {} timed out after {} seconds while fetching {context}. The model may be loading or the server overloaded.",
                self.base_url,
                self.timeout.as_secs()
            ));
        }
        classify_connect_error(error, &self.base_url, self.origin.as_deref(), context)
    }
}

/// Pull `choices[0].message.content` out of a raw response body.
fn extract_chat_content(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value["choices"][0]["message"]["content"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

/// An `https`-served shell cannot call an `http` endpoint; browsers block
/// the request before it leaves (mixed content). Detected by comparing the
/// origin scheme against the endpoint scheme.
fn is_mixed_content(origin: Option<&str>, base_url: &str) -> bool {
    let origin_is_https = origin
        .and_then(|o| Url::parse(o).ok())
        .map(|u| u.scheme() == "https")
        .unwrap_or(false);
    let endpoint_is_http = Url::parse(base_url)
        .map(|u| u.scheme() == "http")
        .unwrap_or_else(|_| base_url.starts_with("http:"));
    origin_is_https && endpoint_is_http
}

fn unreachable_message(base_url: &str, origin: Option<&str>) -> String {
    if is_mixed_content(origin, base_url) {
        format!(
            "Blocked: the app is served over HTTPS but {base_url} is plain HTTP, which browsers refuse (mixed content). Use an HTTPS endpoint or run the app over HTTP."
        )
    } else {
        format!(
            "Could not connect to {base_url}. Ensure the server is running, reachable, and 'OLLAMA_ORIGINS=\"*\"' is set if remote."
        )
    }
}

fn classify_connect_error(
    error: &reqwest::Error,
    base_url: &str,
    origin: Option<&str>,
    context: &str,
) -> AiError {
    if error.is_connect() || error.is_request() {
        AiError::NetworkUnreachable(unreachable_message(base_url, origin))
    } else if error.is_decode() {
        AiError::MalformedResponse(format!(
            "The server at {base_url} returned an unreadable response while fetching {context}: {error}"
        ))
    } else {
        AiError::Unknown(format!("failed to get {context} from the API: {error}"))
    }
}

fn classify_http_failure(
    status: reqwest::StatusCode,
    body: &str,
    base_url: &str,
    model: &str,
    context: &str,
) -> AiError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return AiError::InvalidCredential(format!(
            "The server at {base_url} rejected the configured API key ({status}). Please check the key in Settings."
        ));
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        let lowered = body.to_lowercase();
        if lowered.contains("model") && lowered.contains("not found") {
            return AiError::ModelNotFound(format!(
                "The model '{model}' was not found on the server. Please check the model name in Settings or pull it first."
            ));
        }
        return AiError::ModelNotFound(format!(
            "The server returned 404 at {base_url}. If the URL is correct, the model '{model}' might not exist. Server message: {}",
            if body.is_empty() { "Not Found" } else { body }
        ));
    }
    AiError::Unknown(format!(
        "failed to get {context} from the API (status {status}): {body}"
    ))
}

impl AiProvider for OpenAiCompatibleProvider {
    fn analyze_and_correct<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, Result<CorrectionResult, AiError>> {
        Box::pin(async move {
            let system = "You are an expert in Docker and Docker Compose. Analyze the provided docker-compose.yml content, correct any errors, and suggest best practices. Respond with a single JSON object containing the 'correctedCode' and a 'suggestions' array. The 'suggestions' array should contain objects with 'suggestion' and optional 'example' keys. IMPORTANT: The 'correctedCode' must be RAW YAML only. Do NOT include markdown backticks (like ```yaml).";
            let prompt = format!("Analyze and correct this docker-compose.yml:\n\n```yaml\n{code}\n```");
            let raw: CorrectionResult = self
                .execute_json_command(system, prompt, "suggestions and corrections")
                .await?;
            Ok(CorrectionResult {
                corrected_code: markdown::strip(&raw.corrected_code),
                suggestions: raw.suggestions,
            })
        })
    }

    fn explain<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Explanation, AiError>> {
        Box::pin(async move {
            let system = "You are an expert in Docker and Docker Compose. Analyze the provided docker-compose.yml content and provide a clear, high-level explanation of what it does. Respond with a single JSON object containing an 'explanation' key.";
            let prompt = format!("Explain what this docker-compose.yml does:\n\n```yaml\n{code}\n```");
            self.execute_json_command(system, prompt, "file explanation")
                .await
        })
    }

    fn contextual_help<'a>(
        &'a self,
        keyword: &'a str,
    ) -> BoxFuture<'a, Result<ContextualHelpResult, AiError>> {
        Box::pin(async move {
            let system = "You are an expert on Docker Compose. Provide a clear explanation and a simple YAML code example for a given Docker Compose keyword. Respond with a single JSON object containing 'explanation' and 'example' keys. IMPORTANT: The 'example' field must be RAW YAML only. Do NOT wrap the example code in markdown (no ```yaml).";
            let prompt = format!("Provide help for the keyword: \"{keyword}\"");
            let raw: ContextualHelpResult = self
                .execute_json_command(system, prompt, "contextual help")
                .await?;
            Ok(ContextualHelpResult {
                explanation: raw.explanation,
                example: markdown::strip(&raw.example),
            })
        })
    }

    fn format<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<FormattedCode, AiError>> {
        Box::pin(async move {
            let system = "You are an expert YAML formatter specializing in Docker Compose files. Your only task is to format the provided docker-compose.yml content. Apply 2-space indentation, ensure consistent spacing, and maintain valid YAML syntax. Do not alter any values, keys, or logic. Respond with a single JSON object containing a 'formattedCode' key. IMPORTANT: The 'formattedCode' must be RAW YAML. Do NOT wrap it in markdown backticks.";
            let prompt = format!("Format this docker-compose.yml:\n\n```yaml\n{code}\n```");
            let raw: FormattedCode = self
                .execute_json_command(system, prompt, "code formatting")
                .await?;
            Ok(FormattedCode {
                formatted_code: markdown::strip(&raw.formatted_code),
            })
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Outcome of a connectivity probe against a self-hosted endpoint.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// The base URL that actually answered. May differ from the input when
    /// the `/v1` retry succeeded; callers should persist this one and not
    /// resubmit the original.
    pub canonical_url: String,
    /// Model ids the server advertises.
    pub available_models: Vec<String>,
    /// Non-fatal finding: configured model missing, or URL auto-corrected.
    pub warning: Option<String>,
}

/// Probe `{base_url}/models`, retrying with a `/v1` suffix when the URL as
/// entered does not answer. Loose model matching tolerates tag suffixes
/// (`llama3` matches `llama3:latest`).
pub async fn probe(base_url: &str, model: &str, origin: Option<&str>) -> Result<ProbeReport, AiError> {
    let trimmed = base_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    let mut canonical = None;
    let mut models_payload = None;

    match fetch_models(&client, trimmed).await {
        Ok(payload) => {
            canonical = Some(trimmed.to_string());
            models_payload = Some(payload);
        }
        Err(first_err) => {
            if !trimmed.ends_with("/v1") {
                let v1_url = format!("{trimmed}/v1");
                if let Ok(payload) = fetch_models(&client, &v1_url).await {
                    canonical = Some(v1_url);
                    models_payload = Some(payload);
                }
            }
            if canonical.is_none() {
                debug!(error = %first_err, "connectivity probe failed on both URLs");
            }
        }
    }

    let Some(canonical_url) = canonical else {
        return Err(AiError::NetworkUnreachable(unreachable_message(
            trimmed, origin,
        )));
    };

    let available_models = models_payload
        .as_deref()
        .map(parse_model_ids)
        .unwrap_or_default();

    let mut warnings = Vec::new();
    let wanted = model.trim();
    if !wanted.is_empty() && !available_models.is_empty() {
        let found = available_models
            .iter()
            .any(|id| id == wanted || id.starts_with(&format!("{wanted}:")));
        if !found {
            let listed: Vec<&str> = available_models.iter().take(5).map(String::as_str).collect();
            warnings.push(format!(
                "Connected, but model '{wanted}' not found. Available: {}...",
                listed.join(", ")
            ));
        }
    }
    if canonical_url != trimmed {
        warnings.push("URL auto-corrected to include /v1".to_string());
    }

    Ok(ProbeReport {
        canonical_url,
        available_models,
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join(" "))
        },
    })
}

async fn fetch_models(client: &reqwest::Client, base_url: &str) -> Result<String, AiError> {
    let response = client
        .get(format!("{base_url}/models"))
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map_err(|e| classify_connect_error(&e, base_url, None, "model list"))?;
    if !response.status().is_success() {
        return Err(AiError::NetworkUnreachable(format!(
            "GET {base_url}/models answered {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|e| classify_connect_error(&e, base_url, None, "model list"))
}

/// Parse the OpenAI `/models` list shape: `{"data": [{"id": ...}, ...]}`.
fn parse_model_ids(payload: &str) -> Vec<String> {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| {
            v["data"].as_array().map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(str::to_string))
                    .collect()
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("llama3".into(), base_url.into(), None, None).unwrap()
    }

    #[test]
    fn trailing_slash_is_normalized_at_construction() {
        assert_eq!(
            provider("http://localhost:11434/v1/").base_url(),
            "http://localhost:11434/v1"
        );
    }

    #[test]
    fn missing_fields_fail_construction() {
        let err =
            OpenAiCompatibleProvider::new(String::new(), "http://x".into(), None, None).unwrap_err();
        assert_eq!(err.category(), "invalid-config");
        assert!(err.to_string().contains("Model Name"));
    }

    #[test]
    fn chat_content_extraction() {
        let payload = r#"{"choices":[{"message":{"role":"assistant","content":"{\"explanation\":\"x\"}"}}]}"#;
        assert_eq!(
            extract_chat_content(payload).unwrap(),
            r#"{"explanation":"x"}"#
        );
        assert!(extract_chat_content(r#"{"choices":[]}"#).is_none());
        assert!(
            extract_chat_content(r#"{"choices":[{"message":{"content":"  "}}]}"#).is_none(),
            "blank content counts as empty"
        );
    }

    #[test]
    fn mixed_content_is_detected_by_scheme_comparison() {
        assert!(is_mixed_content(
            Some("https://editor.example.com"),
            "http://localhost:11434/v1"
        ));
        assert!(!is_mixed_content(
            Some("http://localhost:3000"),
            "http://localhost:11434/v1"
        ));
        assert!(!is_mixed_content(
            Some("https://editor.example.com"),
            "https://ai.internal/v1"
        ));
        // Native runs have no origin and never trip the check.
        assert!(!is_mixed_content(None, "http://localhost:11434/v1"));
    }

    #[test]
    fn mixed_content_gets_the_named_message() {
        let msg = unreachable_message("http://localhost:11434/v1", Some("https://app.example"));
        assert!(msg.contains("mixed content"), "{msg}");
        let msg = unreachable_message("http://localhost:11434/v1", None);
        assert!(msg.contains("OLLAMA_ORIGINS"), "{msg}");
    }

    #[test]
    fn http_failures_classify_into_the_taxonomy() {
        let err = classify_http_failure(
            reqwest::StatusCode::UNAUTHORIZED,
            "unauthorized",
            "http://localhost:11434/v1",
            "llama3",
            "file explanation",
        );
        assert_eq!(err.category(), "invalid-credential");

        let err = classify_http_failure(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error":{"message":"model 'llama9' not found, try pulling it first"}}"#,
            "http://localhost:11434/v1",
            "llama9",
            "file explanation",
        );
        assert_eq!(err.category(), "model-not-found");
        assert!(err.to_string().contains("pull"));

        let err = classify_http_failure(
            reqwest::StatusCode::NOT_FOUND,
            "",
            "http://localhost:9999",
            "llama3",
            "file explanation",
        );
        assert_eq!(err.category(), "model-not-found");
        assert!(err.to_string().contains("404"));

        let err = classify_http_failure(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom",
            "http://localhost:11434/v1",
            "llama3",
            "file explanation",
        );
        assert_eq!(err.category(), "unknown");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn model_list_parsing_and_loose_match_shape() {
        let ids = parse_model_ids(
            r#"{"object":"list","data":[{"id":"llama3:latest"},{"id":"qwen2.5-coder"}]}"#,
        );
        assert_eq!(ids, vec!["llama3:latest", "qwen2.5-coder"]);
        assert!(parse_model_ids("not json").is_empty());
        assert!(parse_model_ids("{}").is_empty());
    }
}
