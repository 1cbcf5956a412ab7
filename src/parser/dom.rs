// src/parser/dom.rs
//! A small, forgiving document tree for note bodies.
//!
//! Note bodies are nominally XHTML, but exports from older clients and
//! pasted web content routinely break the rules. The tree builder here
//! never fails: stray end tags are ignored, unclosed elements are closed by
//! an ancestor's end tag, and a reader error truncates the document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// HTML elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr", "en-media", "en-todo",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lowercase tag name.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search for the first descendant with the given tag.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serializes the element and its descendants back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(el, out),
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&quick_xml::escape::escape(value.as_str()));
        out.push('"');
    }
    if is_void(&element.name) && element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(&quick_xml::escape::escape(text.as_str())),
            Node::Element(el) => write_element(el, out),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parses markup into a tree under a synthetic `#document` root.
pub fn parse_html(html: &str) -> Element {
    let mut reader = Reader::from_str(html);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;
    }

    let mut stack: Vec<Element> = vec![Element::new("#document")];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = start_element(&e);
                if is_void(&element.name) {
                    append_child(&mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Ok(Event::Empty(e)) => {
                append_child(&mut stack, Node::Element(start_element(&e)));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                close_element(&mut stack, &name);
            }
            Ok(Event::Text(e)) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut stack, decode_entities(&raw).into_owned());
            }
            Ok(Event::CData(e)) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut stack, raw);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!(
                    "Markup error at byte {}, truncating: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            // Comments, processing instructions, declarations, doctypes
            Ok(_) => {}
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().unwrap_or_else(|| Element::new("#document"))
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = decode_entities(&raw).into_owned();
            (key, value)
        })
        .collect();
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn append_child(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn append_text(stack: &mut [Element], text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        if let Some(Node::Text(previous)) = top.children.last_mut() {
            previous.push_str(&text);
            return;
        }
        top.children.push(Node::Text(text));
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        append_child(stack, Node::Element(element));
    }
}

/// Closes the nearest open element with this name, along with anything
/// left open inside it. Unknown end tags are dropped.
fn close_element(stack: &mut Vec<Element>, name: &str) {
    let Some(position) = stack.iter().rposition(|el| el.name == name) else {
        return;
    };
    if position == 0 {
        return;
    }
    while stack.len() > position {
        close_top(stack);
    }
}

/// Resolves character references and HTML named entities. Anything that
/// does not resolve, like the `&` in `AT&T`, is kept as written.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let resolved = tail
            .find(';')
            .filter(|&end| end > 0 && end <= 32)
            .and_then(|end| resolve_entity(&tail[..end]).map(|text| (text, end)));
        match resolved {
            Some((text, end)) => {
                out.push_str(&text);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(entity: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = entity.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_html_entity(entity).map(Cow::Borrowed)
}

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    let resolved = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "zwnj" => "\u{200c}",
        "zwj" => "\u{200d}",
        "shy" => "\u{ad}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "sbquo" => "‚",
        "ldquo" => "“",
        "rdquo" => "”",
        "bdquo" => "„",
        "laquo" => "«",
        "raquo" => "»",
        "bull" => "•",
        "middot" => "·",
        "euro" => "€",
        "pound" => "£",
        "yen" => "¥",
        "cent" => "¢",
        "sect" => "§",
        "para" => "¶",
        "deg" => "°",
        "plusmn" => "±",
        "times" => "×",
        "divide" => "÷",
        "frac12" => "½",
        "frac14" => "¼",
        "frac34" => "¾",
        "larr" => "←",
        "rarr" => "→",
        "uarr" => "↑",
        "darr" => "↓",
        "harr" => "↔",
        "iexcl" => "¡",
        "iquest" => "¿",
        "auml" => "ä",
        "ouml" => "ö",
        "uuml" => "ü",
        "Auml" => "Ä",
        "Ouml" => "Ö",
        "Uuml" => "Ü",
        "szlig" => "ß",
        "eacute" => "é",
        "egrave" => "è",
        "agrave" => "à",
        "aacute" => "á",
        "ccedil" => "ç",
        "ntilde" => "ñ",
        _ => return None,
    };
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(html: &str) -> Element {
        parse_html(html)
    }

    #[test]
    fn test_parses_nested_elements() {
        let doc = body(r#"<en-note><div style="color: red">a<b>b</b></div></en-note>"#);
        let note = doc.find("en-note").unwrap();
        let div = note.find("div").unwrap();
        assert_eq!(div.attr("style"), Some("color: red"));
        assert_eq!(div.text(), "ab");
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = body("<div>a<br>b<hr>c</div>");
        let div = doc.find("div").unwrap();
        assert_eq!(div.children.len(), 5);
        assert_eq!(div.text(), "abc");
    }

    #[test]
    fn test_unmatched_end_tags_are_ignored() {
        let doc = body("<div>a</span>b</div><p>c</p>");
        assert_eq!(doc.find("div").unwrap().text(), "ab");
        assert_eq!(doc.find("p").unwrap().text(), "c");
    }

    #[test]
    fn test_unclosed_elements_close_with_ancestor() {
        let doc = body("<div><b>bold<i>both</div><p>after</p>");
        let div = doc.find("div").unwrap();
        assert_eq!(div.text(), "boldboth");
        assert_eq!(doc.find("p").unwrap().text(), "after");
    }

    #[test]
    fn test_entities() {
        let doc = body("<div>a&nbsp;b &amp; c &#65; &unknown; AT&T</div>");
        let text = doc.find("div").unwrap().text();
        assert_eq!(text, "a\u{a0}b & c A &unknown; AT&T");
    }

    #[test]
    fn test_cdata_and_doctype() {
        let doc = body(
            r#"<?xml version="1.0"?><!DOCTYPE en-note SYSTEM "x"><en-note><![CDATA[x<y]]></en-note>"#,
        );
        assert_eq!(doc.find("en-note").unwrap().text(), "x<y");
    }

    #[test]
    fn test_serialization() {
        let doc = body(r#"<div class="x">a &amp; b<br/></div>"#);
        assert_eq!(
            doc.find("div").unwrap().to_html(),
            r#"<div class="x">a &amp; b<br/></div>"#
        );
    }
}
