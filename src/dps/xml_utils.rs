use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::XmlParseError;

const BOM: char = '\u{feff}';

/// Brasília time, applied to timestamps that carry no offset.
const BRASILIA_OFFSET_SECS: i32 = -3 * 3600;

/// A parsed XML element with its children, attributes and text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub prefix: Option<String>,
    /// Local name, without any namespace prefix.
    pub name: String,
    /// Qualified attribute names with their unescaped values, in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Concatenated text content, untrimmed.
    pub text: String,
}

impl XmlNode {
    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given local name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlNode::text)
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Attribute value by qualified or local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name || k.rsplit(':').next() == Some(name))
            .map(|(_, v)| v.as_str())
    }

    /// Namespace URI bound to this element's own prefix, if declared on it.
    pub fn namespace(&self) -> Option<&str> {
        let key = match &self.prefix {
            Some(p) => format!("xmlns:{p}"),
            None => "xmlns".to_string(),
        };
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the element is bound to, or declares, the given namespace.
    pub fn declares_namespace(&self, uri: &str) -> bool {
        self.namespace() == Some(uri)
            || self
                .attributes
                .iter()
                .any(|(k, v)| (k == "xmlns" || k.starts_with("xmlns:")) && v == uri)
    }

    /// Depth-first search for the first element with the given local name,
    /// this element included.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn open_node(e: &BytesStart<'_>) -> Result<XmlNode, XmlParseError> {
    let qname = e.name();
    let mut node = XmlNode {
        prefix: qname.prefix().map(|p| utf8(p.as_ref())),
        name: utf8(qname.local_name().as_ref()),
        ..Default::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlParseError::Malformed(err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| XmlParseError::Malformed(err.to_string()))?;
        node.attributes
            .push((utf8(attr.key.as_ref()), value.into_owned()));
    }
    Ok(node)
}

fn attach(
    node: XmlNode,
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
) -> Result<(), XmlParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(XmlParseError::Malformed(
                "document has more than one root element".into(),
            ));
        }
    }
    Ok(())
}

/// Parse an XML document into its root element.
///
/// A leading byte-order mark is ignored. Empty or whitespace-only input is
/// reported as [`XmlParseError::Empty`]; any reader failure, unbalanced tag
/// or second root element as [`XmlParseError::Malformed`].
pub fn parse_document(xml: &str) -> Result<XmlNode, XmlParseError> {
    let xml = xml.strip_prefix(BOM).unwrap_or(xml);
    if xml.trim().is_empty() {
        return Err(XmlParseError::Empty);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(open_node(e)?),
            Ok(Event::Empty(ref e)) => {
                let node = open_node(e)?;
                attach(node, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| {
                    XmlParseError::Malformed("unexpected closing tag".into())
                })?;
                attach(node, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| XmlParseError::Malformed(err.to_string()))?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(XmlParseError::Malformed(
                            "text outside of the root element".into(),
                        ));
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlParseError::Malformed(e.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlParseError::Malformed(format!(
            "element '{}' is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| XmlParseError::Malformed("document has no root element".into()))
}

/// Parse a decimal accepting either `.` or `,` as the fractional separator.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(&s.replacen(',', ".", 1)).ok()
}

/// XSD `xs:decimal` lexical form, dot separator only.
pub fn is_xsd_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.is_none_or(all_digits)
}

/// Sign of an [`is_xsd_decimal`] literal, read from the text so that values
/// beyond `Decimal` precision are still judged: no leading `-` and at least
/// one non-zero digit.
pub fn is_positive_xsd_decimal(s: &str) -> bool {
    !s.starts_with('-') && s.bytes().any(|b| matches!(b, b'1'..=b'9'))
}

/// Strict ISO-8601 date-time with an explicit offset (`Z` or `±hh:mm`),
/// optionally with fractional seconds.
pub fn parse_xsd_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s.trim()).ok()
}

/// Lenient date-time: everything [`parse_xsd_datetime`] accepts, plus
/// offset-less timestamps read as Brasília time. With `allow_date_only`,
/// a bare `YYYY-MM-DD` is read as midnight.
pub fn parse_datetime(s: &str, allow_date_only: bool) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Some(dt) = parse_xsd_datetime(s) {
        return Some(dt);
    }

    let brasilia = FixedOffset::east_opt(BRASILIA_OFFSET_SECS)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return brasilia.from_local_datetime(&naive).single();
    }
    if allow_date_only {
        let naive = parse_xsd_date(s)?.and_hms_opt(0, 0, 0)?;
        return brasilia.from_local_datetime(&naive).single();
    }
    None
}

/// XSD `xs:date` in the `YYYY-MM-DD` form.
pub fn parse_xsd_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Exactly `n` ASCII digits.
pub fn is_digits(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

/// Drop everything that is not an ASCII digit.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
