//! # schema-split
//!
//! Labels a JSON Schema into a translation ledger and labeled pieces, and resolves the pieces
//! into one artifact per language.

use clap::{Parser, Subcommand};
use log::{error, info};
use miette::{miette, Result};
use schema_split::api::{self, RenderReport};
use schema_split::output;
use schema_split::{Config, LabeledSchema, Ledger};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "schema-split", version, about)]
struct Cli {
    /// Run configuration (YAML or JSON). Defaults match the viewer schema.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log every label and dereferenced pointer.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Label a schema: write the translation ledger and the labeled pieces.
    Label {
        schema: PathBuf,
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Resolve labeled pieces with a (translated) ledger into one artifact per language.
    Resolve {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        pieces: PathBuf,
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Label a schema and resolve it in one run.
    Build {
        schema: PathBuf,
        #[arg(short, long)]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Label { schema, out_dir } => {
            let labeled = label(&schema, &config)?;
            write_labeled(&labeled, &config, &out_dir)?;
        }
        Commands::Resolve {
            ledger,
            pieces,
            out_dir,
        } => {
            let text = output::read_to_string(&ledger)?;
            let ledger = Ledger::from_csv(&text, config.languages.clone())?;
            let fragments = output::read_pieces(&pieces)?;
            info!("Resolving {} pieces with {} ledger rows", fragments.len(), ledger.len());
            let report = api::render(&fragments, &ledger, config.pretty);
            finish(report, &out_dir)?;
        }
        Commands::Build { schema, out_dir } => {
            let labeled = label(&schema, &config)?;
            write_labeled(&labeled, &config, &out_dir)?;
            let fragments = labeled.fragments(&config)?;
            let report = api::render(&fragments, &labeled.ledger, config.pretty);
            finish(report, &out_dir)?;
        }
    }
    Ok(())
}

fn label(schema: &Path, config: &Config) -> Result<LabeledSchema> {
    let source = output::read_to_string(schema)?;
    let file_name = schema.to_string_lossy();
    Ok(api::label_schema(&source, &file_name, config)?)
}

/// Writes the ledger and the labeled pieces under `out_dir`.
fn write_labeled(labeled: &LabeledSchema, config: &Config, out_dir: &Path) -> Result<()> {
    output::ensure_dir(out_dir)?;
    let ledger_path = out_dir.join(&config.ledger_file);
    output::write_atomic(&ledger_path, &labeled.ledger_csv()?)?;
    info!("Wrote {} ledger rows to {}", labeled.ledger.len(), ledger_path.display());

    let fragments = labeled.fragments(config)?;
    output::write_pieces(&out_dir.join("pieces"), &fragments)?;
    Ok(())
}

/// Writes every artifact that resolved, then fails if anything did not.
fn finish(report: RenderReport, out_dir: &Path) -> Result<()> {
    let written = output::write_artifacts(out_dir, &report.artifacts);

    for failure in &report.failures {
        error!(
            "{} ({}): {}",
            failure.section, failure.language, failure.error
        );
    }
    for failure in &written.failures {
        error!("{failure}: {}", failure.source);
    }

    let failed = report.failures.len() + written.failures.len();
    if failed > 0 {
        return Err(miette!(
            "{failed} artifact(s) failed, {} written",
            written.written.len()
        ));
    }
    info!("Done: {} artifacts", written.written.len());
    Ok(())
}
