//! Hosted backend adapter for Google's generative-language API.
//!
//! Every operation is a structured-output `generateContent` call: the
//! request carries a response schema and the backend answers with
//! schema-conformant JSON text. The credential is injected through the
//! constructor only; there is no ambient environment fallback.
//!
//! Unlike the self-hosted adapter, no local timeout is layered on these
//! calls. The hosted transport manages its own deadline, and stacking a
//! second one would change which category a slow call fails into.

use crate::llm::provider::AiProvider;
use crate::llm::types::{
    AiError, ContextualHelpResult, CorrectionResult, Explanation, FormattedCode,
};
use crate::markdown;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini implementation of [`AiProvider`].
///
/// Stateless aside from its immutable configuration; concurrent calls
/// share nothing beyond the connection pool.
#[derive(Debug)]
pub struct GeminiProvider {
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(model: String, api_key: Option<String>) -> Result<Self, AiError> {
        if model.trim().is_empty() {
            return Err(AiError::InvalidConfig(
                "gemini: Model name is required.".to_string(),
            ));
        }
        Ok(Self {
            model,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    /// Issue one structured-output call and parse the JSON it returns.
    ///
    /// The backend is asked for `application/json` against `schema`, but a
    /// response that wraps its JSON in a json-tagged fence is still
    /// accepted: the fenced content is extracted before parsing.
    async fn execute_json_command<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: serde_json::Value,
        context: &str,
    ) -> Result<T, AiError> {
        let api_key = self.api_key.clone().unwrap_or_default();
        if api_key.is_empty() {
            return Err(AiError::InvalidCredential(
                "The provided Gemini API key is invalid or missing. Please ensure it is configured correctly in Settings.".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        debug!(%request_id, model = %self.model, context, "sending Gemini generateContent request");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let response = self
            .client
            .post(format!("{API_BASE}/{}:generateContent", self.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, context))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e, context))?;

        if !status.is_success() {
            warn!(%request_id, %status, context, "Gemini request failed");
            return Err(classify_api_failure(status, &payload, &self.model, context));
        }

        let text = extract_candidate_text(&payload).ok_or_else(|| {
            AiError::MalformedResponse(format!(
                "The Gemini API returned a response without any candidate text while fetching {context}. Retrying may help."
            ))
        })?;

        let parsable = markdown::unwrap_json_fence(&text);
        serde_json::from_str(parsable).map_err(|e| {
            AiError::MalformedResponse(format!(
                "Could not parse the Gemini response for {context} as the expected JSON shape: {e}. Retrying may help."
            ))
        })
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a raw response body.
fn extract_candidate_text(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.trim().to_string())
}

fn classify_transport_error(error: &reqwest::Error, context: &str) -> AiError {
    if error.is_connect() || error.is_request() {
        AiError::NetworkUnreachable(format!(
            "Could not reach the Gemini API while fetching {context}. Check your internet connection. ({error})"
        ))
    } else if error.is_decode() {
        AiError::MalformedResponse(format!(
            "The Gemini API returned an unreadable response while fetching {context}: {error}"
        ))
    } else {
        AiError::Unknown(format!("failed to get {context} from the Gemini API: {error}"))
    }
}

fn classify_api_failure(
    status: reqwest::StatusCode,
    body: &str,
    model: &str,
    context: &str,
) -> AiError {
    if body.contains("API_KEY_INVALID") || body.contains("API key not valid") {
        return AiError::InvalidCredential(
            "The provided Gemini API key is invalid or missing. Please ensure it is configured correctly in Settings.".to_string(),
        );
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return AiError::InvalidCredential(format!(
            "The Gemini API rejected the configured credential ({status}). Please check the API key in Settings."
        ));
    }
    if status == reqwest::StatusCode::NOT_FOUND || body.contains("Requested entity was not found")
    {
        return AiError::ModelNotFound(format!(
            "The model '{model}' was not found on the Gemini API. Please check the model name in Settings."
        ));
    }
    AiError::Unknown(format!(
        "failed to get {context} from the Gemini API (status {status}): {body}"
    ))
}

impl AiProvider for GeminiProvider {
    fn analyze_and_correct<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, Result<CorrectionResult, AiError>> {
        Box::pin(async move {
            let prompt = format!(
                "You are an expert in Docker and Docker Compose. Analyze the provided docker-compose.yml content, correct it, and provide helpful suggestions with examples.\n\
                 \n\
                 Analyze the following `docker-compose.yml` content:\n\
                 ```yaml\n{code}\n```\n\
                 Your tasks:\n\
                 1. Correct the code (syntax, indentation, deprecated keys, etc.).\n\
                 2. Ensure all comments are placed on their own line above the code they refer to, not inline.\n\
                 3. Provide helpful hints and best practices (security, performance, maintainability).\n\
                 4. IMPORTANT: The 'correctedCode' must be RAW YAML only. Do NOT include markdown backticks (like ```yaml) at the start or end.\n\
                 \n\
                 Return the result in JSON format."
            );
            let schema = json!({
                "type": "OBJECT",
                "properties": {
                    "correctedCode": { "type": "STRING" },
                    "suggestions": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "suggestion": { "type": "STRING" },
                                "example": { "type": "STRING" }
                            },
                            "required": ["suggestion"]
                        }
                    }
                },
                "required": ["correctedCode", "suggestions"]
            });

            let raw: CorrectionResult = self
                .execute_json_command(prompt, schema, "suggestions and corrections")
                .await?;
            Ok(CorrectionResult {
                corrected_code: markdown::strip(&raw.corrected_code),
                suggestions: raw.suggestions,
            })
        })
    }

    fn explain<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Explanation, AiError>> {
        Box::pin(async move {
            let prompt = format!(
                "You are an expert in Docker and Docker Compose. Analyze the provided docker-compose.yml content and provide a clear, high-level explanation of what it does.\n\
                 \n\
                 Analyze the following `docker-compose.yml` content:\n\
                 ```yaml\n{code}\n```\n\
                 Your tasks:\n\
                 1. Provide a concise explanation of the file's purpose.\n\
                 2. Use Markdown formatting (headings, bullet points, bold text) to make the explanation easy to read.\n\
                 3. Do NOT output raw JSON structure in the text, just the markdown string within the JSON response.\n\
                 Return the result in JSON format."
            );
            let schema = json!({
                "type": "OBJECT",
                "properties": {
                    "explanation": {
                        "type": "STRING",
                        "description": "A high-level explanation of the docker-compose file, formatted with Markdown."
                    }
                },
                "required": ["explanation"]
            });

            self.execute_json_command(prompt, schema, "file explanation")
                .await
        })
    }

    fn contextual_help<'a>(
        &'a self,
        keyword: &'a str,
    ) -> BoxFuture<'a, Result<ContextualHelpResult, AiError>> {
        Box::pin(async move {
            let prompt = format!(
                "As an expert on Docker Compose, provide a clear, concise explanation and a simple YAML code example for the following Docker Compose keyword: \"{keyword}\".\n\
                 Focus on the primary use case of the keyword.\n\
                 IMPORTANT: The 'example' field must be RAW YAML. Do NOT wrap the example code in markdown (no ```yaml).\n\
                 Return the result in JSON format."
            );
            let schema = json!({
                "type": "OBJECT",
                "properties": {
                    "explanation": { "type": "STRING" },
                    "example": {
                        "type": "STRING",
                        "description": "Raw YAML example code. No markdown."
                    }
                },
                "required": ["explanation", "example"]
            });

            let raw: ContextualHelpResult = self
                .execute_json_command(prompt, schema, "contextual help")
                .await?;
            Ok(ContextualHelpResult {
                explanation: raw.explanation,
                example: markdown::strip(&raw.example),
            })
        })
    }

    fn format<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<FormattedCode, AiError>> {
        Box::pin(async move {
            let prompt = format!(
                "You are an expert YAML formatter specializing in Docker Compose files. Your only task is to format the following docker-compose.yml content.\n\
                 \n\
                 RULES:\n\
                 - Use 2 spaces for indentation.\n\
                 - Maintain consistent spacing around colons and hyphens.\n\
                 - Ensure proper YAML syntax.\n\
                 - Move inline comments to the line above the item they describe. Do not keep comments on the same line as code.\n\
                 - Do not change any values, keys, or the logic of the file. Only fix formatting issues.\n\
                 - IMPORTANT: The output 'formattedCode' must be RAW YAML. Do NOT wrap it in markdown code blocks (no ```yaml).\n\
                 \n\
                 Content to format:\n\
                 ```yaml\n{code}\n```\n\
                 Return the result in JSON format with a single key \"formattedCode\"."
            );
            let schema = json!({
                "type": "OBJECT",
                "properties": {
                    "formattedCode": {
                        "type": "STRING",
                        "description": "The perfectly formatted docker-compose.yml content. Raw YAML only."
                    }
                },
                "required": ["formattedCode"]
            });

            let raw: FormattedCode = self
                .execute_json_command(prompt, schema, "code formatting")
                .await?;
            Ok(FormattedCode {
                formatted_code: markdown::strip(&raw.formatted_code),
            })
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_extraction() {
        let payload = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "{\"explanation\": \"runs nginx\"}" }] }
            }]
        }"#;
        assert_eq!(
            extract_candidate_text(payload).unwrap(),
            r#"{"explanation": "runs nginx"}"#
        );
        assert!(extract_candidate_text("{}").is_none());
        assert!(extract_candidate_text("not json").is_none());
    }

    #[test]
    fn api_failure_classification() {
        let err = classify_api_failure(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": {"status": "INVALID_ARGUMENT", "message": "API key not valid. Please pass a valid API key."}}"#,
            "gemini-2.5-flash",
            "file explanation",
        );
        assert_eq!(err.category(), "invalid-credential");

        let err = classify_api_failure(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error": {"message": "Requested entity was not found."}}"#,
            "gemini-2.5-flash",
            "file explanation",
        );
        assert_eq!(err.category(), "model-not-found");
        assert!(err.to_string().contains("gemini-2.5-flash"));

        let err = classify_api_failure(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "backend exploded",
            "gemini-2.5-flash",
            "file explanation",
        );
        assert_eq!(err.category(), "unknown");
        assert!(err.to_string().contains("backend exploded"));
    }

    #[test]
    fn empty_model_is_rejected_at_construction() {
        let err = GeminiProvider::new("  ".into(), Some("key".into())).unwrap_err();
        assert_eq!(err.category(), "invalid-config");
    }
}
