use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

pub const NPORT_FILINGS_DIR: &str = "data/nport/filings";
pub const NPORT_TABLES_DIR: &str = "data/nport/tables";

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| anyhow!("Failed to create directory {:?}: {}", path, e))?;
    Ok(())
}
