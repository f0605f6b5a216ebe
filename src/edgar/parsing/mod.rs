pub mod document;
pub mod header;
pub mod markup;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use markup::{Element, Markup};
pub use types::{FilingDocument, MISSING};
