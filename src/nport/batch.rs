use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

use super::assemble::{AssembledFiling, Assembler};
use super::mapping::Relation;
use super::sink::RelationSink;
use crate::edgar::filing::{read_filing, source_name};
use crate::edgar::parsing::FilingDocument;
use crate::utils::progress::ProgressTracker;

/// Records gathered from a batch of filings, plus the files that were skipped.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub sink: RelationSink,
    pub processed: usize,
    pub skipped: Vec<PathBuf>,
}

impl Extraction {
    fn new(assembler: &Assembler) -> Self {
        Extraction {
            sink: RelationSink::for_registry(assembler.registry()),
            processed: 0,
            skipped: Vec::new(),
        }
    }

    // A filing that cannot be read is skipped; the batch always continues.
    fn record(&mut self, path: PathBuf, result: Result<AssembledFiling>) {
        match result {
            Ok(filing) => {
                self.sink.append_filing(filing);
                self.processed += 1;
            }
            Err(e) => {
                log::warn!("Skipping {:?}: {}", path, e);
                self.skipped.push(path);
            }
        }
    }

    fn log_summary(&self) {
        log::info!(
            "Extracted {} filings ({} skipped): {}",
            self.processed,
            self.skipped.len(),
            Relation::iter()
                .map(|r| format!("{}={}", r, self.sink.len(r)))
                .join(", ")
        );
    }
}

pub fn extract_file(assembler: &Assembler, path: &Path) -> Result<AssembledFiling> {
    let text = read_filing(path)?;
    let document = FilingDocument::parse(&source_name(path), &text);
    Ok(assembler.assemble(&document))
}

/// Processes filings one after another on the current thread.
pub fn extract_filings_blocking(paths: &[PathBuf], assembler: &Assembler) -> Extraction {
    let mut extraction = Extraction::new(assembler);
    for path in paths {
        let result = extract_file(assembler, path);
        extraction.record(path.clone(), result);
    }
    extraction.log_summary();
    extraction
}

/// Processes filings on the blocking pool with up to `jobs` in flight.
///
/// Results are appended in input order, so the output does not depend on
/// `jobs`.
pub async fn extract_filings(
    paths: Vec<PathBuf>,
    assembler: &Assembler,
    jobs: usize,
    progress: &ProgressTracker,
) -> Extraction {
    let jobs = jobs.max(1);
    let mut extraction = Extraction::new(assembler);
    log::info!("Extracting {} filings with {} workers", paths.len(), jobs);
    progress.start(paths.len() as u64);

    let mut results = stream::iter(paths)
        .map(|path| {
            let assembler = assembler.clone();
            async move {
                let task_path = path.clone();
                let result =
                    tokio::task::spawn_blocking(move || extract_file(&assembler, &task_path))
                        .await
                        .map_err(|e| anyhow!("Extraction task failed: {}", e))
                        .and_then(|result| result);
                (path, result)
            }
        })
        .buffered(jobs);

    while let Some((path, result)) = results.next().await {
        progress.update_message(&source_name(&path));
        extraction.record(path, result);
        progress.increment();
    }

    progress.finish(&format!(
        "{} filings extracted, {} skipped",
        extraction.processed,
        extraction.skipped.len()
    ));
    extraction.log_summary();
    extraction
}
