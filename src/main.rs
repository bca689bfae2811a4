use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use record_enricher::config::EnrichConfig;
use record_enricher::document_io::{read_document, write_document};
use record_enricher::logging;
use record_enricher::pipeline::{IdScheme, Pipeline};
use record_enricher::types::{CollectionSpec, RunContext};

#[derive(Parser, Debug)]
#[command(name = "record-enricher")]
#[command(about = "Add object ids, audit metadata and data-quality checks to JSON record collections")]
#[command(version)]
struct Cli {
    /// Input JSON document
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output path for the enriched document
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Source label recorded in each audit block (defaults to the input path)
    #[arg(long)]
    source: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Identifier scheme: sha256 or uuid5
    #[arg(long = "id-scheme")]
    id_scheme: Option<IdScheme>,

    /// Days after which an inactive account without transactions is flagged
    #[arg(long = "inactive-window-days")]
    inactive_window_days: Option<i64>,

    /// Record collection as FIELD=KIND (air_quality, account, transaction); repeatable
    #[arg(long = "collection")]
    collections: Vec<CollectionSpec>,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut EnrichConfig) {
        if let Some(scheme) = self.id_scheme {
            config.id_scheme = scheme;
        }
        if let Some(days) = self.inactive_window_days {
            config.inactive_window_days = days;
        }
        if !self.collections.is_empty() {
            config.collections = self.collections.clone();
        }
        if self.compact {
            config.pretty = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = EnrichConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_to(&mut config);
    config.validate()?;

    let _guard = logging::init_logging(&config.log_dir).context("initializing logging")?;

    let source = cli.source.clone().unwrap_or_else(|| cli.input.display().to_string());
    let run = RunContext::starting_now(source);

    info!(input = %cli.input.display(), "Reading document");
    let document = read_document(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;

    let pipeline = Pipeline::new(config.pipeline_config());
    let enriched = match pipeline.enrich_document(&document, &run) {
        Ok(enriched) => enriched,
        Err(e) => {
            error!("Enrichment aborted: {}", e);
            return Err(e).context("enriching document; no output written");
        }
    };

    info!(output = %cli.output.display(), "Writing enriched document");
    write_document(&cli.output, &enriched.document, config.pretty)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    let summary = &enriched.summary;
    info!(total = summary.total, passed = summary.passed, failed = summary.failed, "Done");
    println!("Total: {}, Passed: {}, Failed: {}", summary.total, summary.passed, summary.failed);
    Ok(())
}
