use html_escape::decode_html_entities;

pub const FILED_AS_OF_DATE: &str = "FILED AS OF DATE:";

/// Value that follows `marker` on the first preamble line containing it.
///
/// Returns `None` when the marker is absent or nothing but whitespace
/// follows it on that line.
pub fn header_value(preamble: &str, marker: &str) -> Option<String> {
    preamble.lines().find_map(|line| {
        let index = line.find(marker)?;
        let value = line[index + marker.len()..].trim();
        if value.is_empty() {
            None
        } else {
            Some(decode_html_entities(value).into_owned())
        }
    })
}

pub fn filing_date(preamble: &str) -> Option<String> {
    header_value(preamble, FILED_AS_OF_DATE)
}
