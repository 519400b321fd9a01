//! # Docker Compose Assistant
//!
//! Core of an AI-assisted Docker Compose editor: the pieces that turn a
//! compose file and a configured AI backend into reviewable edits.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: provider abstraction over two interchangeable AI
//!   backends (hosted Gemini, self-hosted OpenAI-compatible) behind one
//!   contract, with request construction, response repair, and a closed
//!   failure taxonomy
//! - **[`diff`]**: line-based diff used to render before/after
//!   comparisons of AI-suggested edits
//! - **[`markdown`]**: best-effort stripping of code-fence artifacts the
//!   backends are told not to emit but sometimes do anyway
//! - **[`cli`]**: argument parsing and settings persistence for the
//!   command-line shell
//!
//! The visual editor, theming, and file load/save live elsewhere; this
//! crate exposes the operations they call and the data they render.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dca::llm::{ProviderConfig, ProviderFactory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProviderConfig::OpenAiCompatible {
//!         model: "llama3".into(),
//!         base_url: "http://localhost:11434/v1".into(),
//!         api_key: None,
//!         origin: None,
//!     };
//!     let provider = ProviderFactory::build(Some(&config))?
//!         .expect("config present");
//!
//!     let original = "version: '2'\nservices:\n  web:\n    image: nginx";
//!     let result = provider.analyze_and_correct(original).await?;
//!     for line in dca::diff::diff(original, &result.corrected_code) {
//!         println!("{:?} {}", line.kind, line.text);
//!     }
//!     Ok(())
//! }
//! ```

/// Line-based diff between two versions of a compose file.
pub mod diff;

/// Markdown fence stripping for AI responses.
pub mod markdown;

/// Provider abstraction: contract, backend adapters, factory, and the
/// failure taxonomy.
pub mod llm;

/// Command-line interface: argument parsing and settings persistence.
pub mod cli;

/// Path and file-name constants.
pub mod env;

pub use diff::{DiffKind, DiffLine};
pub use llm::{
    AiError, AiProvider, ContextualHelpResult, CorrectionResult, Explanation, FormattedCode,
    ProviderConfig, ProviderFactory, Suggestion,
};
