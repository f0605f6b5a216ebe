use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

// Arena index of the synthetic root that owns every top-level element.
const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct ElementData {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    // Exclusive end of this element's subtree in the arena. Elements are
    // stored in document order, so descendants are `index + 1..end`.
    end: usize,
}

/// Parsed markup body of a filing.
///
/// Built by a tolerant reader: mismatched or missing end tags are repaired,
/// and a syntax error stops reading while keeping everything seen so far.
/// Tag and attribute names are stored without their namespace prefix.
#[derive(Debug, Clone)]
pub struct Markup {
    elements: Vec<ElementData>,
}

/// Borrowed handle to one element of a [`Markup`] tree.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    markup: &'a Markup,
    index: usize,
}

impl Markup {
    pub fn empty() -> Self {
        Markup {
            elements: vec![ElementData {
                name: String::new(),
                attributes: Vec::new(),
                text: String::new(),
                end: 1,
            }],
        }
    }

    pub fn parse(input: &str) -> Self {
        let mut builder = TreeBuilder::new();
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => builder.open(e),
                Ok(Event::Empty(ref e)) => {
                    builder.open(e);
                    builder.close_current();
                }
                Ok(Event::End(ref e)) => {
                    builder.close(&String::from_utf8_lossy(e.local_name().as_ref()));
                }
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => decode_lenient(&e),
                    };
                    builder.text(&text);
                }
                Ok(Event::CData(e)) => {
                    builder.text(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::debug!(
                        "Markup reading stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                _ => (),
            }
        }

        builder.finish()
    }

    /// The synthetic document root; its children are the top-level elements.
    pub fn root(&self) -> Element<'_> {
        Element {
            markup: self,
            index: ROOT,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Number of elements, not counting the synthetic root.
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }
}

// Decodes known entities and leaves stray `&` as written.
fn decode_lenient(raw: &[u8]) -> String {
    html_escape::decode_html_entities(&String::from_utf8_lossy(raw)).into_owned()
}

impl Default for Markup {
    fn default() -> Self {
        Markup::empty()
    }
}

impl<'a> Element<'a> {
    fn data(&self) -> &'a ElementData {
        &self.markup.elements[self.index]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn has_tag_name(&self, tag: &str) -> bool {
        self.name() == tag
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text that belongs directly to this element, without descendant text.
    pub fn text(&self) -> &'a str {
        &self.data().text
    }

    /// All elements below this one in depth-first pre-order, excluding itself.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let markup = self.markup;
        (self.index + 1..self.data().end).map(move |index| Element { markup, index })
    }

    /// First descendant with the given local tag name.
    pub fn find(&self, tag: &str) -> Option<Element<'a>> {
        self.descendants().find(|e| e.has_tag_name(tag))
    }

    pub fn find_all<'t>(&self, tag: &'t str) -> impl Iterator<Item = Element<'a>> + 't
    where
        'a: 't,
    {
        self.descendants().filter(move |e| e.has_tag_name(tag))
    }
}

struct TreeBuilder {
    elements: Vec<ElementData>,
    open: Vec<usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            elements: Markup::empty().elements,
            open: vec![ROOT],
        }
    }

    fn current(&self) -> usize {
        *self.open.last().unwrap_or(&ROOT)
    }

    fn open(&mut self, start: &BytesStart<'_>) {
        let index = self.elements.len();

        let mut attributes = Vec::new();
        for attr in start.attributes().with_checks(false).flatten() {
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => decode_lenient(&attr.value),
            };
            attributes.push((key, value));
        }

        self.elements.push(ElementData {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            end: index + 1,
        });
        self.open.push(index);
    }

    fn close_current(&mut self) {
        if self.open.len() > 1 {
            if let Some(index) = self.open.pop() {
                self.elements[index].end = self.elements.len();
            }
        }
    }

    // An end tag closes the nearest open element with that name, along with
    // anything left unclosed inside it. End tags with no open match are dropped.
    fn close(&mut self, name: &str) {
        let Some(position) = self
            .open
            .iter()
            .skip(1)
            .rposition(|&index| self.elements[index].name == name)
        else {
            return;
        };
        while self.open.len() > position + 1 {
            self.close_current();
        }
    }

    fn text(&mut self, text: &str) {
        let current = self.current();
        self.elements[current].text.push_str(text);
    }

    fn finish(mut self) -> Markup {
        while self.open.len() > 1 {
            self.close_current();
        }
        self.elements[ROOT].end = self.elements.len();
        Markup {
            elements: self.elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_match_in_document_order() {
        let markup = Markup::parse(
            r#"<root><a><name>first</name></a><name>second</name><b><name>third</name></b></root>"#,
        );
        let root = markup.root();
        assert_eq!(root.find("name").unwrap().text(), "first");
        let names: Vec<_> = root.find_all("name").map(|e| e.text()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_text_excludes_descendants() {
        let markup = Markup::parse("<a> outer <b>inner</b> tail </a>");
        let a = markup.root().find("a").unwrap();
        assert_eq!(a.text(), " outer  tail ");
        assert_eq!(a.find("b").unwrap().text(), "inner");
    }

    #[test]
    fn test_prefixes_are_stripped() {
        let markup = Markup::parse(
            r#"<edgarSubmission xmlns="http://www.sec.gov/edgar/nport" xmlns:com="http://www.sec.gov/edgar/common">
                <com:street1>1 Main St</com:street1>
                <isin com:value="US0000000001"/>
            </edgarSubmission>"#,
        );
        let root = markup.root();
        assert_eq!(root.find("street1").unwrap().text(), "1 Main St");
        let isin = root.find("isin").unwrap();
        assert_eq!(isin.name(), "isin");
        assert_eq!(isin.attribute("value"), Some("US0000000001"));
        assert_eq!(root.find("edgarSubmission").unwrap().attribute("com"), None);
    }

    #[test]
    fn test_descendants_stay_in_scope() {
        let markup = Markup::parse("<r><s><x>1</x></s><s><y>2</y></s><x>3</x></r>");
        let scopes: Vec<_> = markup.root().find_all("s").collect();
        assert_eq!(scopes.len(), 2);
        assert!(scopes[1].find("x").is_none());
        assert_eq!(scopes[1].find("y").unwrap().text(), "2");
    }

    #[test]
    fn test_unclosed_and_mismatched_tags() {
        let markup = Markup::parse("<DOC><TYPE>NPORT-P<body><v>1</v></wrong></DOC><after>2</after>");
        let root = markup.root();
        assert_eq!(root.find("v").unwrap().text(), "1");
        let doc = root.find("DOC").unwrap();
        assert!(doc.find("after").is_none());
        assert_eq!(root.find("after").unwrap().text(), "2");
    }

    #[test]
    fn test_syntax_error_keeps_partial_tree() {
        let markup = Markup::parse("<a><b>kept</b><c attr=\"unterminated></a>");
        assert_eq!(markup.root().find("b").unwrap().text(), "kept");
    }

    #[test]
    fn test_plain_text_yields_empty_tree() {
        let markup = Markup::parse("no markup here at all");
        assert!(markup.is_empty());
        assert!(markup.root().find("anything").is_none());
    }

    #[test]
    fn test_entities_and_cdata() {
        let markup = Markup::parse(r#"<a t="x &amp; y">A &amp; B<![CDATA[ <raw> ]]></a><b>C & D</b>"#);
        let a = markup.root().find("a").unwrap();
        assert_eq!(a.attribute("t"), Some("x & y"));
        assert_eq!(a.text(), "A & B <raw> ");
        assert_eq!(markup.root().find("b").unwrap().text(), "C & D");
    }

    #[test]
    fn test_stray_ampersand_keeps_other_entities_decoded() {
        let markup =
            Markup::parse(r#"<r><regName>AT&T &amp; Co</regName><desc k="A&B &lt;C&gt;"/></r>"#);
        let root = markup.root();
        assert_eq!(root.find("regName").unwrap().text(), "AT&T & Co");
        assert_eq!(root.find("desc").unwrap().attribute("k"), Some("A&B <C>"));
    }
}
