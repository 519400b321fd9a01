use crate::llm::gemini::GeminiProvider;
use crate::llm::openai_compat::OpenAiCompatibleProvider;
use crate::llm::types::{
    AiError, ContextualHelpResult, CorrectionResult, Explanation, FormattedCode, ProviderConfig,
};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Backend-agnostic contract every AI backend implements.
///
/// All four operations are independent asynchronous units of work: an
/// adapter holds only its immutable configuration, so concurrent calls
/// share nothing and need no locking. Each call either fully succeeds with
/// a normalized result (string fields already run through the fence
/// stripper) or fully fails with one classified [`AiError`]; partially
/// parseable payloads are a [`AiError::MalformedResponse`] of the whole
/// operation. No retries happen at this layer.
pub trait AiProvider: Send + Sync + std::fmt::Debug {
    /// Correct the compose file and collect improvement suggestions.
    fn analyze_and_correct<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, Result<CorrectionResult, AiError>>;

    /// High-level markdown explanation of what the file does.
    fn explain<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Explanation, AiError>>;

    /// Explanation plus YAML example for one compose keyword.
    fn contextual_help<'a>(
        &'a self,
        keyword: &'a str,
    ) -> BoxFuture<'a, Result<ContextualHelpResult, AiError>>;

    /// Reformat the file without changing keys, values, or logic.
    fn format<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<FormattedCode, AiError>>;

    /// Short backend identifier for logs and error context.
    fn provider_name(&self) -> &'static str;
}

/// Builds the right adapter for a stored configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Construct a provider from a stored configuration, or `None` when no
    /// configuration exists (AI features disabled, not an error).
    ///
    /// Construction only shape-checks the configuration; no network I/O
    /// happens here. Reachability surfaces on the first real call or via
    /// the explicit connectivity probe. A structurally invalid config
    /// fails with the provider name in the message.
    pub fn build(config: Option<&ProviderConfig>) -> Result<Option<Arc<dyn AiProvider>>, AiError> {
        let Some(config) = config else {
            return Ok(None);
        };

        let provider: Arc<dyn AiProvider> = match config {
            ProviderConfig::Gemini { model, api_key } => {
                Arc::new(GeminiProvider::new(model.clone(), api_key.clone())?)
            }
            ProviderConfig::OpenAiCompatible {
                model,
                base_url,
                api_key,
                origin,
            } => Arc::new(OpenAiCompatibleProvider::new(
                model.clone(),
                base_url.clone(),
                api_key.clone(),
                origin.clone(),
            )?),
        };

        Ok(Some(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_config_disables_ai_without_failing() {
        let provider = ProviderFactory::build(None).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn valid_gemini_config_builds() {
        let config = ProviderConfig::Gemini {
            model: "gemini-2.5-flash".into(),
            api_key: Some("key".into()),
        };
        let provider = ProviderFactory::build(Some(&config)).unwrap().unwrap();
        assert_eq!(provider.provider_name(), "gemini");
    }

    #[test]
    fn valid_openai_compatible_config_builds() {
        let config = ProviderConfig::OpenAiCompatible {
            model: "llama3".into(),
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            origin: None,
        };
        let provider = ProviderFactory::build(Some(&config)).unwrap().unwrap();
        assert_eq!(provider.provider_name(), "openai-compatible");
    }

    #[test]
    fn self_hosted_config_without_required_fields_fails_loudly() {
        let config = ProviderConfig::OpenAiCompatible {
            model: String::new(),
            base_url: String::new(),
            api_key: None,
            origin: None,
        };
        let err = ProviderFactory::build(Some(&config)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("openai-compatible"), "{message}");
        assert!(
            message.contains("Base URL") || message.contains("Model"),
            "{message}"
        );
    }

    #[test]
    fn gemini_config_without_model_fails_loudly() {
        let config = ProviderConfig::Gemini {
            model: String::new(),
            api_key: None,
        };
        let err = ProviderFactory::build(Some(&config)).unwrap_err();
        assert!(err.to_string().contains("gemini"), "{err}");
    }

    #[test]
    fn construction_performs_no_network_io() {
        // An unreachable endpoint must still build; only a real call or the
        // probe may discover reachability.
        let config = ProviderConfig::OpenAiCompatible {
            model: "llama3".into(),
            base_url: "http://256.256.256.256:1".into(),
            api_key: None,
            origin: None,
        };
        assert!(ProviderFactory::build(Some(&config)).is_ok());
    }
}
