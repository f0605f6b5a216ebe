use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::nport::OutputFormat;
use crate::utils::dirs::{NPORT_FILINGS_DIR, NPORT_TABLES_DIR};

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractorConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub jobs: usize,
    pub format: OutputFormat,
    pub mappings: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(NPORT_FILINGS_DIR),
            output_dir: PathBuf::from(NPORT_TABLES_DIR),
            jobs: default_jobs(),
            format: OutputFormat::Csv,
            mappings: None,
        }
    }
}

impl ExtractorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let input_dir = lookup("NPORT_INPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.input_dir);

        let output_dir = lookup("NPORT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let jobs = match lookup("NPORT_JOBS") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|jobs| *jobs > 0)
                .ok_or_else(|| anyhow!("NPORT_JOBS must be a positive integer, got '{}'", value))?,
            None => defaults.jobs,
        };

        let format = match lookup("NPORT_FORMAT") {
            Some(value) => OutputFormat::from_str(&value)
                .map_err(|_| anyhow!("NPORT_FORMAT must be 'csv' or 'jsonl', got '{}'", value))?,
            None => defaults.format,
        };

        let mappings = lookup("NPORT_MAPPINGS").map(PathBuf::from);

        Ok(Self {
            input_dir,
            output_dir,
            jobs,
            format,
            mappings,
        })
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
