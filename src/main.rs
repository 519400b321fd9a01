use anyhow::{Context, bail};
use clap::Parser;
use dca::cli::{Args, Commands, SettingsStore};
use dca::llm::{self, AiProvider, ProviderConfig, ProviderFactory};
use dca::{diff, markdown};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dca=warn".into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Check { file, write } => run_check(&file, write).await,
        Commands::Explain { file } => run_explain(&file).await,
        Commands::Keyword { keyword } => run_keyword(&keyword).await,
        Commands::Fmt { file, write } => run_fmt(&file, write).await,
        Commands::Probe => run_probe().await,
        Commands::Config {
            provider,
            model,
            base_url,
            api_key,
        } => run_config(provider, model, base_url, api_key),
        Commands::ShowConfig => {
            SettingsStore::show_discovery_info();
            Ok(())
        }
    }
}

/// Load settings and build a provider, or explain how to enable AI.
fn require_provider() -> anyhow::Result<Arc<dyn AiProvider>> {
    let config = SettingsStore::load().context("failed to load settings")?;
    match ProviderFactory::build(config.as_ref())? {
        Some(provider) => Ok(provider),
        None => bail!(
            "no AI provider configured. Run `dca config --provider openai-compatible \
             --model llama3 --base-url http://localhost:11434/v1` (or --provider gemini) first"
        ),
    }
}

fn read_compose_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn run_check(file: &Path, write: bool) -> anyhow::Result<()> {
    let provider = require_provider()?;
    let original = read_compose_file(file)?;

    info!(provider = provider.provider_name(), "analyzing compose file");
    let result = provider.analyze_and_correct(&original).await?;

    if result.suggestions.is_empty() {
        println!("No suggestions.");
    } else {
        println!("Suggestions:");
        for (i, suggestion) in result.suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion.text);
            if let Some(example) = &suggestion.example {
                for line in markdown::strip(example).lines() {
                    println!("       {line}");
                }
            }
        }
    }

    print_changes(&original, &result.corrected_code);
    if write && result.corrected_code != original {
        fs::write(file, &result.corrected_code)
            .with_context(|| format!("failed to write {}", file.display()))?;
        println!("Wrote corrected file to {}", file.display());
    }
    Ok(())
}

async fn run_explain(file: &Path) -> anyhow::Result<()> {
    let provider = require_provider()?;
    let code = read_compose_file(file)?;
    let result = provider.explain(&code).await?;
    println!("{}", result.explanation);
    Ok(())
}

async fn run_keyword(keyword: &str) -> anyhow::Result<()> {
    let provider = require_provider()?;
    let result = provider.contextual_help(keyword).await?;
    println!("{}", result.explanation);
    if !result.example.is_empty() {
        println!("\nExample:\n{}", result.example);
    }
    Ok(())
}

async fn run_fmt(file: &Path, write: bool) -> anyhow::Result<()> {
    let provider = require_provider()?;
    let original = read_compose_file(file)?;
    let result = provider.format(&original).await?;

    print_changes(&original, &result.formatted_code);
    if write && result.formatted_code != original {
        fs::write(file, &result.formatted_code)
            .with_context(|| format!("failed to write {}", file.display()))?;
        println!("Wrote formatted file to {}", file.display());
    }
    Ok(())
}

async fn run_probe() -> anyhow::Result<()> {
    let config = SettingsStore::load().context("failed to load settings")?;
    let Some(ProviderConfig::OpenAiCompatible {
        model,
        base_url,
        api_key,
        origin,
    }) = config
    else {
        bail!("probe only applies to an openai-compatible configuration");
    };

    let report = llm::probe(&base_url, &model, origin.as_deref()).await?;
    println!("Connected to {}", report.canonical_url);
    if !report.available_models.is_empty() {
        println!("Available models: {}", report.available_models.join(", "));
    }
    if let Some(warning) = &report.warning {
        println!("Warning: {warning}");
    }

    // The URL that answered is canonical from here on.
    if report.canonical_url != base_url.trim_end_matches('/') {
        let corrected = ProviderConfig::OpenAiCompatible {
            model,
            base_url: report.canonical_url.clone(),
            api_key,
            origin,
        };
        let path = SettingsStore::save(&corrected)?;
        println!("Updated base URL in {}", path.display());
    }
    Ok(())
}

fn run_config(
    provider: String,
    model: String,
    base_url: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let config = match provider.as_str() {
        "gemini" => ProviderConfig::Gemini { model, api_key },
        "openai-compatible" => {
            let Some(base_url) = base_url else {
                bail!("--base-url is required for the openai-compatible provider");
            };
            ProviderConfig::OpenAiCompatible {
                model,
                base_url,
                api_key,
                origin: None,
            }
        }
        other => bail!("unknown provider '{other}'; expected \"gemini\" or \"openai-compatible\""),
    };

    // Shape-check before persisting so a bad config never lands on disk.
    ProviderFactory::build(Some(&config))?;

    let path = SettingsStore::save(&config)?;
    println!("Saved settings to {}", path.display());
    Ok(())
}

fn print_changes(original: &str, updated: &str) {
    if original == updated {
        println!("\nNo changes.");
        return;
    }
    println!("\nChanges:");
    print!("{}", diff::render(&diff::diff(original, updated)));
}
