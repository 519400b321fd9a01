pub mod gemini;
pub mod openai_compat;
pub mod provider;
pub mod types;

pub use gemini::GeminiProvider;
pub use openai_compat::{OpenAiCompatibleProvider, ProbeReport, probe};
pub use provider::{AiProvider, ProviderFactory};
pub use types::*;
