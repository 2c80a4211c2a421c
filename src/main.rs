use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use doc_outline::chunking::{CharCounter, Chunker, ChunkerConfig, HfTokenCounter, TokenCounter};
use doc_outline::core::config::{AppPaths, ConfigService};
use doc_outline::core::logging;
use doc_outline::extract::{LlmStructureExtractor, OutlinePipeline};
use doc_outline::llm::{LlmProvider, OpenAiCompatProvider};
use doc_outline::validate::LineMatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(source) = env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: doc-outline <markdown-file>");
    };

    let paths = Arc::new(AppPaths::from_env().context("Failed to prepare data directories")?);
    logging::init(&paths.log_dir).context("Failed to initialize logging")?;

    let config = ConfigService::new(paths.clone());
    let settings = config
        .load_settings()
        .context("Failed to load configuration")?;

    let counter: Box<dyn TokenCounter> = match &settings.chunking.tokenizer_path {
        Some(path) => Box::new(
            HfTokenCounter::from_path(path)
                .with_context(|| format!("Failed to load tokenizer from {}", path.display()))?,
        ),
        None => {
            tracing::warn!("No tokenizer configured, counting characters instead");
            Box::new(CharCounter)
        }
    };
    let chunker = Chunker::new(
        ChunkerConfig {
            max_tokens: settings.chunking.max_tokens,
        },
        move |text: &str| counter.count_tokens(text),
    );

    let provider = OpenAiCompatProvider::from_settings(&settings.llm)
        .context("Failed to create LLM client")?;
    if !provider.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "LLM endpoint {} did not answer the health check",
            provider.base_url()
        );
    }
    let extractor = LlmStructureExtractor::from_settings(provider, &settings.llm);

    let pipeline = OutlinePipeline::new(chunker, extractor, settings.pipeline.clone())
        .with_matcher(LineMatcher::new(settings.validation.threshold))
        .with_output_dir(paths.output_dir.clone());

    let outcome = pipeline
        .run(&source)
        .await
        .with_context(|| format!("Failed to build outline for {}", source.display()))?;

    println!("outline: {}", outcome.output_path.display());
    println!(
        "chunks: {} ({} skipped)",
        outcome.chunks,
        outcome.skipped.len()
    );
    println!(
        "titles found: {}/{} (threshold {})",
        outcome.report.found_count(),
        outcome.report.total(),
        outcome.report.threshold
    );
    for result in &outcome.report.results {
        let mark = if result.found { "ok" } else { "--" };
        let line = result
            .line_number
            .map(|n| format!("L{}", n))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {:.3} {:>6}  {}",
            mark, result.match_score, line, result.title
        );
    }

    Ok(())
}
