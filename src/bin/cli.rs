use anyhow::Result;
use colored::*;
use nport_extract::{
    core::config::ExtractorConfig,
    edgar::filing,
    nport::{extract_filings, write_tables, Assembler, MappingRegistry, OutputFormat, Relation},
    ProgressTracker,
};
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "nport-cli",
    about = "Extract N-PORT filings into header, general, fund and securities tables"
)]
struct Opt {
    /// Filing files or directories of filings (defaults to NPORT_INPUT_DIR)
    #[structopt(parse(from_os_str))]
    inputs: Vec<PathBuf>,

    /// Directory the tables are written to
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Number of filings processed concurrently
    #[structopt(short, long)]
    jobs: Option<usize>,

    /// Output format: csv or jsonl
    #[structopt(short, long)]
    format: Option<OutputFormat>,

    /// JSON mapping set replacing the built-in N-PORT fields
    #[structopt(short, long, parse(from_os_str))]
    mappings: Option<PathBuf>,

    /// Hide the progress bar
    #[structopt(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = ExtractorConfig::from_env()?;
    if let Some(output) = opt.output {
        config.output_dir = output;
    }
    if let Some(jobs) = opt.jobs {
        config.jobs = jobs.max(1);
    }
    if let Some(format) = opt.format {
        config.format = format;
    }
    if opt.mappings.is_some() {
        config.mappings = opt.mappings;
    }

    let registry = match &config.mappings {
        Some(path) => {
            log::info!("Loading mapping set from {:?}", path);
            MappingRegistry::from_file(path)?
        }
        None => MappingRegistry::nport(),
    };
    let assembler = Assembler::new(Arc::new(registry));

    let inputs = if opt.inputs.is_empty() {
        vec![config.input_dir.clone()]
    } else {
        opt.inputs
    };
    let paths = filing::collect_inputs(&inputs)?;
    if paths.is_empty() {
        eprintln!("{}", "No filings found".yellow());
        return Ok(());
    }

    let progress = ProgressTracker::new(!opt.quiet);
    let extraction = extract_filings(paths, &assembler, config.jobs, &progress).await;

    let written = write_tables(&extraction.sink, &config.output_dir, config.format)?;

    println!(
        "{} {} filings",
        "Extracted".green().bold(),
        extraction.processed
    );
    for relation in Relation::iter() {
        println!("  {:<16} {:>8} rows", relation.to_string(), extraction.sink.len(relation));
    }
    for path in &written {
        println!("  {} {}", "wrote".cyan(), path.display());
    }
    if !extraction.skipped.is_empty() {
        println!(
            "{} {} unreadable filings",
            "Skipped".yellow().bold(),
            extraction.skipped.len()
        );
        for path in &extraction.skipped {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
