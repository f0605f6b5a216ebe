pub mod core;
pub mod edgar;
pub mod nport;
pub mod utils;

// Re-exports
pub use nport::{Assembler, MappingRegistry, RelationSink};
pub use utils::progress::ProgressTracker;
