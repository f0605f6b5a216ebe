use super::markup::Markup;

/// Placeholder written wherever a field is absent from a filing.
pub const MISSING: &str = "n/a";

/// One submission, split into its plain-text preamble and its markup body.
#[derive(Debug, Clone)]
pub struct FilingDocument {
    pub identifier: String,
    pub filing_date: Option<String>,
    pub markup: Markup,
}

impl FilingDocument {
    /// Filing date from the preamble, or [`MISSING`].
    pub fn filing_date_or_missing(&self) -> &str {
        self.filing_date.as_deref().unwrap_or(MISSING)
    }
}
