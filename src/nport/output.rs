use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString, IntoEnumIterator};

use super::mapping::Relation;
use super::sink::RelationSink;
use crate::utils::dirs::ensure_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum OutputFormat {
    #[default]
    #[strum(serialize = "csv")]
    Csv,
    #[strum(to_string = "jsonl", serialize = "json")]
    JsonLines,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::JsonLines => "jsonl",
        }
    }
}

/// Writes one file per relation into `output_dir` and returns their paths.
pub fn write_tables(
    sink: &RelationSink,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    ensure_dir(output_dir)?;

    let mut written = Vec::new();
    for relation in Relation::iter() {
        let table = sink.emit(relation);
        let path = output_dir.join(format!("{}.{}", table.name, format.extension()));
        let file =
            File::create(&path).map_err(|e| anyhow!("Failed to create {:?}: {}", path, e))?;
        let writer = BufWriter::new(file);

        match format {
            OutputFormat::Csv => table.write_csv(writer)?,
            OutputFormat::JsonLines => table.write_json_lines(writer)?,
        }

        log::info!("Wrote {} rows to {:?}", table.rows.len(), path);
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nport::assemble::Record;
    use crate::nport::mapping::MappingRegistry;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("jsonl").unwrap(), OutputFormat::JsonLines);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::JsonLines);
        assert!(OutputFormat::from_str("parquet").is_err());
    }

    #[test]
    fn test_write_tables_creates_one_file_per_relation() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("tables");
        let mut sink = RelationSink::for_registry(&MappingRegistry::nport());
        let mut record = Record::new("0001");
        record.push("form_type", "NPORT-P".to_string());
        record.push("confidential", "false".to_string());
        sink.append(Relation::Header, record);

        let written = write_tables(&sink, &output_dir, OutputFormat::Csv).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "header_data.csv",
                "general_data.csv",
                "fund_data.csv",
                "securities_data.csv"
            ]
        );

        let header = std::fs::read_to_string(output_dir.join("header_data.csv")).unwrap();
        assert_eq!(header, "accession_number,form_type,confidential\n0001,NPORT-P,false\n");
        let securities = std::fs::read_to_string(output_dir.join("securities_data.csv")).unwrap();
        assert!(securities.starts_with("accession_number,name,cusip,balance,units,"));
        assert_eq!(securities.lines().count(), 1);
    }
}
