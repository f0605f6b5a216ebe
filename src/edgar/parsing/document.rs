use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::header;
use super::markup::Markup;
use super::types::FilingDocument;

static XML_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<XML>(.*?)</XML>").unwrap());

impl FilingDocument {
    pub fn parse(source_name: &str, raw_text: &str) -> Self {
        let identifier = identifier_from_source(source_name);
        let (preamble, body) = split_submission(raw_text);

        let filing_date = header::filing_date(preamble);
        if filing_date.is_none() {
            log::debug!("{}: no filing date in preamble", identifier);
        }

        let markup = Markup::parse(body);
        log::debug!("{}: parsed {} markup elements", identifier, markup.len());

        FilingDocument {
            identifier,
            filing_date,
            markup,
        }
    }
}

/// Accession number from a file name such as `0001752724-23-011234.txt`.
pub fn identifier_from_source(source_name: &str) -> String {
    Path::new(source_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| source_name.to_string())
}

/// Splits a submission into (preamble, markup body).
///
/// EDGAR full-text submissions wrap the XML document in `<XML>` tags; only
/// the first such region is read. Without the wrapper the whole text is both
/// the preamble and the body.
pub fn split_submission(raw_text: &str) -> (&str, &str) {
    let Some(cap) = XML_BODY.captures(raw_text) else {
        return (raw_text, raw_text);
    };
    let start = cap.get(0).map_or(0, |m| m.start());
    let body = cap.get(1).map_or("", |m| m.as_str());
    (&raw_text[..start], body.trim())
}
