//! Minimal element tree over quick-xml.
//!
//! Office parts are small enough to build a tree per part, which keeps the
//! readers free of event-loop state machines. The lenient mode tolerates
//! HTML-style markup (void elements, unmatched end tags, bare attributes).

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A child node.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Nested element
    Element(XmlElement),
    /// Character data with entities resolved
    Text(String),
}

/// An element with its local name, attributes and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name (namespace prefix stripped)
    pub name: String,
    /// Attributes as (qualified key, value)
    pub attrs: Vec<(String, String)>,
    /// Children in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Attribute by local name, preferring an unprefixed key.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == local)
            .or_else(|| self.attrs.iter().find(|(k, _)| local_part(k) == local))
            .map(|(_, v)| v.as_str())
    }

    /// Attribute by local name, only among prefixed keys (e.g. `r:id`).
    pub fn prefixed_attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.contains(':') && local_part(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Follow a path of child names.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names
            .iter()
            .try_fold(self, |el, name| el.child(name))
    }

    /// First descendant (depth-first, excluding self) with the given name.
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order.
    pub fn descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.descendants(name, out);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

fn local_part(key: &str) -> &str {
    key.rsplit_once(':').map_or(key, |(_, l)| l)
}

/// Parse a well-formed XML part.
pub fn parse(bytes: &[u8]) -> Result<XmlElement> {
    build(bytes, false)
}

/// Parse tag soup (HTML output of external converters).
pub fn parse_lenient(bytes: &[u8]) -> Result<XmlElement> {
    build(bytes, true)
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

fn build(bytes: &[u8], lenient: bool) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        if lenient {
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }
    }

    // Synthetic root so fragments with several top-level nodes still parse
    let mut stack: Vec<XmlElement> = vec![XmlElement::new(String::new())];
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) if lenient => {
                log::debug!("stopping lenient parse at malformed markup: {}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match event {
            Event::Start(ref e) => {
                let el = start_element(e, lenient);
                if lenient && VOID_ELEMENTS.contains(&el.name.as_str()) {
                    push_child(&mut stack, XmlNode::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Event::Empty(ref e) => {
                let el = start_element(e, lenient);
                push_child(&mut stack, XmlNode::Element(el));
            }
            Event::End(ref e) => {
                let name = normalize_name(e.local_name().as_ref(), lenient);
                close_element(&mut stack, &name, lenient);
            }
            Event::Text(ref e) => {
                let raw: &[u8] = e;
                push_text(&mut stack, &unescape(&String::from_utf8_lossy(raw)));
            }
            Event::CData(ref e) => {
                let raw: &[u8] = e;
                push_text(&mut stack, &String::from_utf8_lossy(raw));
            }
            Event::GeneralRef(ref e) => {
                let name: &[u8] = e;
                let name = String::from_utf8_lossy(name);
                match resolve_entity(&name) {
                    Some(resolved) => push_text(&mut stack, &resolved),
                    None => push_text(&mut stack, &format!("&{};", name)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // Unclosed elements fold into their parents
    while stack.len() > 1 {
        if let Some(el) = stack.pop() {
            push_child(&mut stack, XmlNode::Element(el));
        }
    }
    let mut root = stack.pop().unwrap_or_default();

    // Unwrap the synthetic root when the document has a single root element
    let element_count = root.elements().count();
    if element_count == 1 && !lenient {
        let index = root
            .children
            .iter()
            .position(|c| matches!(c, XmlNode::Element(_)));
        if let Some(XmlNode::Element(el)) = index.map(|i| root.children.swap_remove(i)) {
            return Ok(el);
        }
    }
    if element_count == 0 && !lenient {
        return Err(Error::ContainerRead("XML part has no root element".into()));
    }
    root.name = "#document".to_string();
    Ok(root)
}

fn normalize_name(raw: &[u8], lenient: bool) -> String {
    let name = String::from_utf8_lossy(raw).into_owned();
    if lenient {
        name.to_ascii_lowercase()
    } else {
        name
    }
}

fn start_element(e: &BytesStart<'_>, lenient: bool) -> XmlElement {
    let mut el = XmlElement::new(normalize_name(e.local_name().as_ref(), lenient));
    let attrs: Vec<_> = if lenient {
        e.html_attributes().flatten().collect()
    } else {
        e.attributes().flatten().collect()
    };
    for attr in attrs {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let key = if lenient { key.to_ascii_lowercase() } else { key };
        let value = unescape(&String::from_utf8_lossy(&attr.value));
        el.attrs.push((key, value));
    }
    el
}

fn push_child(stack: &mut [XmlElement], node: XmlNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        if let Some(XmlNode::Text(prev)) = top.children.last_mut() {
            prev.push_str(text);
        } else {
            top.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

fn close_element(stack: &mut Vec<XmlElement>, name: &str, lenient: bool) {
    if !lenient {
        if stack.len() > 1 {
            if let Some(el) = stack.pop() {
                push_child(stack, XmlNode::Element(el));
            }
        }
        return;
    }
    // Ignore end tags with no matching open element
    let Some(pos) = stack.iter().rposition(|el| el.name == name) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        if let Some(el) = stack.pop() {
            push_child(stack, XmlNode::Element(el));
        }
    }
}

/// Resolve a named or numeric entity reference (without `&` and `;`).
pub fn resolve_entity(name: &str) -> Option<String> {
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            return char::from_u32(code).map(String::from);
        }
    };
    Some(resolved.to_string())
}

/// Replace entity references in raw markup text.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(semi) if semi <= 10 => match resolve_entity(&after[..semi]) {
                Some(resolved) => {
                    out.push_str(&resolved);
                    rest = &after[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_namespaces() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Hi &amp; bye</w:t></w:r></w:p></w:body></w:document>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "document");
        let p = root.path(&["body", "p"]).unwrap();
        assert_eq!(p.text(), "Hi & bye");
    }

    #[test]
    fn test_attr_lookup() {
        let xml = br#"<sldId id="256" r:id="rId2"/>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.attr("id"), Some("256"));
        assert_eq!(root.prefixed_attr("id"), Some("rId2"));
    }

    #[test]
    fn test_prefixed_value_fallback() {
        let root = parse(br#"<w:pStyle w:val="Heading1"/>"#).unwrap();
        assert_eq!(root.attr("val"), Some("Heading1"));
    }

    #[test]
    fn test_lenient_html() {
        let html = b"<html><body><p>One<br>Two</p><p>Three</b></p><ul><li>A<li>B</ul></body></html>";
        let root = parse_lenient(html).unwrap();
        let mut ps = Vec::new();
        root.descendants("p", &mut ps);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].text(), "OneTwo");
        assert_eq!(ps[1].text(), "Three");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &lt;b&gt; &#65;&#x42;"), "a <b> AB");
        assert_eq!(unescape("AT&T"), "AT&T");
        assert_eq!(unescape("&bogus;"), "&bogus;");
    }
}
