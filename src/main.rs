use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;

use divan_translator::config::{find_default_config, init_default_config, load_config, AppConfig};
use divan_translator::corpus::{build_document, write_document, CorpusRunner};
use divan_translator::ghazal::load_corpus;
use divan_translator::models::AnthropicClient;
use divan_translator::pipeline::{PipelineConfig, TranslationPipeline};
use divan_translator::progress::ConsoleProgress;

#[derive(Parser, Debug)]
#[command(name = "divan-translator")]
#[command(about = "Multi-pass LLM translation of Divan-e Kabir ghazals", long_about = None)]
struct Args {
    /// Input ghazal corpus JSON
    #[arg(short, long, value_name = "JSON", default_value = "sample_ghazals.json")]
    input: PathBuf,

    /// Output translations JSON
    #[arg(short, long, value_name = "JSON", default_value = "pipeline_translations.json")]
    output: PathBuf,

    /// Translate at most N ghazals
    #[arg(short, long)]
    limit: Option<usize>,

    /// Model identifier (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Config file path (default: search divan-translator.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write per-stage prompts and raw outputs to this directory
    #[arg(long, value_name = "DIR")]
    trace_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long)]
    quiet: bool,

    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", path.display());
        return Ok(());
    }

    // Credential check happens before anything else; a missing key is the
    // only startup-fatal condition.
    let api_key = resolve_api_key(args.api_key.as_deref())?;

    let app = match args.config.clone().or_else(find_default_config) {
        Some(path) => load_config(&path)?,
        None => AppConfig::default(),
    };
    let cfg = PipelineConfig::resolve(
        &app,
        args.model.as_deref(),
        args.trace_dir.as_deref(),
        args.quiet,
    );

    let model = AnthropicClient::new(cfg.anthropic(api_key))?;
    let progress = ConsoleProgress::new(cfg.verbose);

    let corpus = load_corpus(&args.input)?;
    progress.info(format!(
        "Loaded {} ghazals from {}",
        corpus.ghazals.len(),
        args.input.display()
    ));
    progress.info(format!("Model: {}", cfg.model));

    let pipeline = TranslationPipeline::new(cfg, Box::new(model), progress.clone());
    let runner = CorpusRunner::new(pipeline, progress);

    // Per-poem failures are reported inside the run and never change the
    // exit code.
    let report = runner.run(&corpus, args.limit);
    let doc = build_document(&corpus, &report.results);
    write_document(&doc, &args.output)?;
    runner.report_summary(&report, &args.output);

    Ok(())
}

fn resolve_api_key(flag: Option<&str>) -> anyhow::Result<String> {
    let key = flag
        .map(|s| s.to_string())
        .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
        .unwrap_or_default();
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(anyhow!(
            "ANTHROPIC_API_KEY is not set or is empty.\n\
             Please either:\n  \
             1. Set the environment variable: export ANTHROPIC_API_KEY='your-key'\n  \
             2. Pass it as an argument: divan-translator --api-key 'your-key'"
        ));
    }
    Ok(key)
}
