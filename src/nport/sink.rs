use anyhow::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::io::Write;
use strum::IntoEnumIterator;

use crate::edgar::parsing::MISSING;

use super::assemble::{AssembledFiling, Record};
use super::mapping::{MappingRegistry, Relation};

#[derive(Debug, Clone, Default)]
struct RelationData {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RelationData {
    fn add_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.to_string());
            }
        }
    }
}

/// Append-only accumulator of records, one sequence per relation.
#[derive(Debug, Clone, Default)]
pub struct RelationSink {
    relations: BTreeMap<Relation, RelationData>,
}

impl RelationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose tables carry the registry's column order even when empty.
    pub fn for_registry(registry: &MappingRegistry) -> Self {
        let mut sink = Self::new();
        for relation in Relation::iter() {
            let columns = registry.columns_for(relation);
            sink.declare_columns(relation, columns.iter().map(String::as_str));
        }
        sink
    }

    pub fn declare_columns<'a>(
        &mut self,
        relation: Relation,
        columns: impl IntoIterator<Item = &'a str>,
    ) {
        self.relations
            .entry(relation)
            .or_default()
            .add_columns(columns);
    }

    pub fn append(&mut self, relation: Relation, record: Record) {
        let data = self.relations.entry(relation).or_default();
        data.add_columns(record.fields().map(|(name, _)| name));
        data.records.push(record);
    }

    pub fn append_filing(&mut self, filing: AssembledFiling) {
        for (relation, record) in filing.into_records() {
            self.append(relation, record);
        }
    }

    /// Appends everything from `other` after the records already held.
    pub fn merge(&mut self, other: RelationSink) {
        for (relation, data) in other.relations {
            self.declare_columns(relation, data.columns.iter().map(String::as_str));
            for record in data.records {
                self.append(relation, record);
            }
        }
    }

    pub fn records(&self, relation: Relation) -> &[Record] {
        self.relations
            .get(&relation)
            .map(|data| data.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self, relation: Relation) -> usize {
        self.records(relation).len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.values().all(|data| data.records.is_empty())
    }

    pub fn emit(&self, relation: Relation) -> Table {
        let Some(data) = self.relations.get(&relation) else {
            return Table {
                name: relation.to_string(),
                columns: Vec::new(),
                rows: Vec::new(),
            };
        };

        let rows: Vec<Vec<String>> = data
            .records
            .iter()
            .map(|record| {
                data.columns
                    .iter()
                    .map(|column| record.get(column).unwrap_or(MISSING).to_string())
                    .collect()
            })
            .collect();

        Table {
            name: relation.to_string(),
            columns: data.columns.clone(),
            rows,
        }
    }
}

/// Rows of one relation in append order, aligned to a fixed column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One JSON object per row, keys in column order.
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> Result<()> {
        for row in &self.rows {
            let row = RowView {
                columns: &self.columns,
                values: row,
            };
            serde_json::to_writer(&mut writer, &row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

struct RowView<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
