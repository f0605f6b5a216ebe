pub mod assemble;
pub mod batch;
pub mod extract;
pub mod mapping;
pub mod output;
pub mod sink;

pub use assemble::{AssembledFiling, Assembler, Record};
pub use batch::{extract_filings, extract_filings_blocking, Extraction};
pub use mapping::{MappingDescriptor, MappingRegistry, Relation};
pub use output::{write_tables, OutputFormat};
pub use sink::{RelationSink, Table};
