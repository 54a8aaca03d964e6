//! Research Pipeline — Binary Entrypoint
//! Loads config, wires the corpus and fetch providers, and runs one pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vault_research_pipeline::config::PipelineConfig;
use vault_research_pipeline::corpus::FsCorpus;
use vault_research_pipeline::fetch::{FetchProvider, StaticProvider};
use vault_research_pipeline::history::HistoryIndex;
use vault_research_pipeline::item::Source;
use vault_research_pipeline::run::{RunCoordinator, RunMode, RunSummary};
use vault_research_pipeline::synthesis::PlainSynthesizer;

#[derive(Parser, Debug)]
#[command(name = "vault-research-pipeline", about = "Daily research note pipeline")]
struct Cli {
    /// Config file path (overrides RESEARCH_CONFIG_PATH).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single topic slug instead of all configured topics.
    #[arg(long)]
    topic: Option<String>,

    /// Scan and rank but write nothing back to the vault.
    #[arg(long)]
    preview: bool,

    /// Only resolve pending tags, no scanning.
    #[arg(long, conflicts_with_all = ["topic", "preview"])]
    promote_only: bool,

    /// Print the deduplication index (seen URLs) and exit.
    #[arg(long)]
    show_dedup: bool,

    /// Directory of fixture files (reddit.json / x.json / web.json) serving
    /// as fetch backends.
    #[arg(long, default_value = "fixtures")]
    fixtures: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vault_research_pipeline=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    match &cli.config {
        Some(path) => PipelineConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => PipelineConfig::load_default().context("loading pipeline config"),
    }
}

fn build_providers(dir: &Path) -> anyhow::Result<Vec<Arc<dyn FetchProvider>>> {
    let mut providers: Vec<Arc<dyn FetchProvider>> = Vec::new();
    for (source, file) in [
        (Source::Reddit, "reddit.json"),
        (Source::X, "x.json"),
        (Source::Web, "web.json"),
    ] {
        let path = dir.join(file);
        if path.is_file() {
            providers.push(Arc::new(StaticProvider::from_json_file(source, &path)?));
        }
    }
    Ok(providers)
}

fn print_summary(summary: &RunSummary) {
    for topic in &summary.topics {
        println!(
            "{:<14} fetched={:<3} spam={:<3} floor={:<3} dup={:<3} kept={}{}",
            topic.track,
            topic.fetched,
            topic.spam_dropped,
            topic.floor_dropped,
            topic.duplicate_dropped,
            topic.kept,
            if topic.failed { "  FAILED" } else { "" },
        );
    }
    println!(
        "promotions={} feedback={} note={}",
        summary.promotions,
        summary.feedback,
        summary.note_path.as_deref().unwrap_or("(not written)"),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let corpus = FsCorpus::open(&cfg.run.corpus_path)?;

    if cli.show_dedup {
        let index = HistoryIndex::build(&corpus, &cfg)?;
        for url in index.seen_urls_sorted() {
            println!("{}", url);
        }
        return Ok(());
    }

    let mode = if cli.promote_only {
        RunMode::PromoteOnly
    } else if cli.preview {
        RunMode::Preview
    } else if let Some(slug) = cli.topic.clone() {
        RunMode::SingleTopic(slug)
    } else {
        RunMode::Full
    };

    let providers = Arc::new(build_providers(&cli.fixtures)?);
    let coordinator = RunCoordinator::new(cfg, mode)?;
    let summary = coordinator
        .run(&corpus, providers, &PlainSynthesizer)
        .await?;

    print_summary(&summary);
    Ok(())
}
