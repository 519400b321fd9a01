use serde::{Deserialize, Serialize};

/// One independently displayable improvement note for a compose file,
/// with an optional illustrative snippet.
///
/// The wire field is `suggestion` (both backends are prompted to emit
/// that key); the struct exposes it as `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "suggestion")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Result of [`analyze_and_correct`](crate::llm::AiProvider::analyze_and_correct).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResult {
    pub corrected_code: String,
    pub suggestions: Vec<Suggestion>,
}

/// Result of [`explain`](crate::llm::AiProvider::explain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
}

/// Result of [`contextual_help`](crate::llm::AiProvider::contextual_help):
/// one request/response pair keyed by a user-selected keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualHelpResult {
    pub explanation: String,
    pub example: String,
}

/// Result of [`format`](crate::llm::AiProvider::format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCode {
    pub formatted_code: String,
}

/// Provider selection plus its connection parameters.
///
/// This is the sole piece of durable state. The JSON shape (tag key
/// `provider`, camelCase fields) matches what the web editor stores, so a
/// settings file and the browser's local storage stay interchangeable.
/// Replaced wholesale on reconfiguration, never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ProviderConfig {
    /// Hosted backend reached through Google's generative-language API.
    #[serde(rename = "gemini", rename_all = "camelCase")]
    Gemini {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    /// Self-hosted OpenAI-compatible HTTP API (Ollama, LM Studio, vLLM...).
    #[serde(rename = "openai-compatible", rename_all = "camelCase")]
    OpenAiCompatible {
        model: String,
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Scheme://host the embedding shell is served from, when there is
        /// one. An `https` origin calling an `http` endpoint is blocked by
        /// browsers (mixed content) and the classifier names that
        /// condition specifically. Unset for native runs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
}

impl ProviderConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            ProviderConfig::Gemini { .. } => "gemini",
            ProviderConfig::OpenAiCompatible { .. } => "openai-compatible",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Gemini { model, .. } => model,
            ProviderConfig::OpenAiCompatible { model, .. } => model,
        }
    }
}

/// Closed failure taxonomy for backend adapters.
///
/// Every error a backend raises is classified into exactly one of these
/// before it crosses the adapter boundary; raw transport and parse errors
/// never escape unclassified. Messages are written so the user can
/// self-correct: configuration problems point at Settings, environment
/// problems at the server or network, content problems at retrying.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    /// Structurally invalid configuration, caught at construction time.
    /// Never produced by the failure classifier; the six categories below
    /// are the closed set every backend call failure maps into.
    #[error("{0}")]
    InvalidConfig(String),
    /// Authentication/key rejected by the backend.
    #[error("{0}")]
    InvalidCredential(String),
    /// The configured model identifier does not exist on the target server.
    #[error("{0}")]
    ModelNotFound(String),
    /// Connection could not be established (DNS, refused, mixed content).
    #[error("{0}")]
    NetworkUnreachable(String),
    /// The call did not complete within the configured deadline.
    /// Raised by the self-hosted adapter only; the hosted transport
    /// manages its own deadline.
    #[error("{0}")]
    Timeout(String),
    /// The payload could not be parsed into the expected shape.
    #[error("{0}")]
    MalformedResponse(String),
    /// Anything else, with the raw underlying message as diagnostic tail.
    #[error("An unexpected error occurred: {0}")]
    Unknown(String),
}

impl AiError {
    /// Stable category tag, useful for logs and assertions.
    pub fn category(&self) -> &'static str {
        match self {
            AiError::InvalidConfig(_) => "invalid-config",
            AiError::InvalidCredential(_) => "invalid-credential",
            AiError::ModelNotFound(_) => "model-not-found",
            AiError::NetworkUnreachable(_) => "network-unreachable",
            AiError::Timeout(_) => "timeout",
            AiError::MalformedResponse(_) => "malformed-response",
            AiError::Unknown(_) => "unknown",
        }
    }

    /// Fixable by the user in settings (key, model name, endpoint URL).
    pub fn is_configuration_problem(&self) -> bool {
        matches!(
            self,
            AiError::InvalidConfig(_) | AiError::InvalidCredential(_) | AiError::ModelNotFound(_)
        )
    }

    /// Transient or environmental; check the server or the network.
    pub fn is_environment_problem(&self) -> bool {
        matches!(self, AiError::NetworkUnreachable(_) | AiError::Timeout(_))
    }

    /// The model returned something unparseable; retrying may help.
    pub fn is_content_problem(&self) -> bool {
        matches!(self, AiError::MalformedResponse(_))
    }
}
