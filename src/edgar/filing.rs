use anyhow::{anyhow, Result};
use chardet::detect;
use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Reads a submission, decoding it with the detected character encoding.
pub fn read_filing(path: &Path) -> Result<String> {
    log::debug!("Reading file: {:?}", path);
    let raw = fs::read(path).map_err(|e| anyhow!("Failed to read {:?}: {}", path, e))?;

    let charenc = detect(&raw).0;
    log::debug!("Detected character encoding: {}", charenc);

    let mut reader = DecodeReaderBytesBuilder::new()
        .encoding(Encoding::for_label(charenc.as_bytes()))
        .build(raw.as_slice());

    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| anyhow!("Failed to decode {:?}: {}", path, e))?;
    Ok(text)
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_filings(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|e| anyhow!("Failed to read directory {:?}: {}", dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => files.push(entry.path()),
            Ok(_) => (),
            Err(e) => log::warn!("Skipping {:?}: {}", entry.path(), e),
        }
    }
    files.sort();
    Ok(files)
}

/// Expands directories into their files; plain paths are kept as given.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_filings(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Name used to derive the document identifier.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
