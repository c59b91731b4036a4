//! A small XML element tree for reading manifests.
//!
//! Documents are parsed with `quick-xml` into [`XmlElement`] nodes that keep
//! child order, attributes and text. Only what manifest reading needs is
//! kept: comments, processing instructions and the DOCTYPE are dropped.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{IconsetError, IconsetErrorKind, IconsetResult};

/// A node in an element's child list.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Character data, unescaped. CDATA sections are folded in here.
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified element name, prefix included.
    name: String,
    /// Attributes keyed by their qualified name (`xml:lang` stays `xml:lang`).
    attributes: HashMap<String, String>,
    /// Child nodes in document order.
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates a new element with the specified name.
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// The qualified name of the element (`svg:rect` stays `svg:rect`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets an attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Sets an attribute value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Returns child elements only, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// The concatenated text of this element's direct text children.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                result.push_str(t);
            }
        }
        result
    }

    /// Adds a child node.
    pub fn add_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }
}

/// Parse a complete document and return its root element.
///
/// Unlike a lenient reader, unclosed elements, mismatched end tags and
/// multiple top-level elements are all rejected.
pub fn parse_document(data: &[u8]) -> IconsetResult<XmlElement> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut element_stack: Vec<XmlElement> = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                element_stack.push(element_from_start(&start)?);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = element_stack.pop() {
                    attach(element, &mut element_stack, &mut root)?;
                }
            }
            Ok(Event::Empty(empty)) => {
                let element = element_from_start(&empty)?;
                attach(element, &mut element_stack, &mut root)?;
            }
            Ok(Event::Text(text)) => {
                let content = text.unescape().map_err(xml_error)?;
                if let Some(parent) = element_stack.last_mut() {
                    if !content.is_empty() {
                        parent.add_child(XmlNode::Text(content.into_owned()));
                    }
                } else if !content.trim().is_empty() {
                    return Err(invalid("text outside the root element"));
                }
            }
            Ok(Event::CData(cdata)) => {
                let content = String::from_utf8_lossy(&cdata).to_string();
                if let Some(parent) = element_stack.last_mut() {
                    parent.add_child(XmlNode::Text(content));
                }
            }
            // Declarations, comments, processing instructions and DOCTYPE
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    if let Some(open) = element_stack.last() {
        return Err(invalid(&format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| invalid("XML document has no root element"))
}

// ============================================================================
// Internal Helpers
// ============================================================================

fn element_from_start(start: &BytesStart<'_>) -> IconsetResult<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| invalid(&e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(xml_error)?;
        element.set_attribute(key, value.into_owned());
    }

    Ok(element)
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> IconsetResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.add_child(XmlNode::Element(element)),
        None if root.is_some() => return Err(invalid("multiple root elements")),
        None => *root = Some(element),
    }
    Ok(())
}

fn invalid(message: &str) -> IconsetError {
    IconsetError::new(
        IconsetErrorKind::InvalidData,
        None,
        Some(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message.to_string(),
        ))),
    )
}

/// Converts a quick_xml error to an IconsetError.
fn xml_error(e: quick_xml::Error) -> IconsetError {
    IconsetError::new(IconsetErrorKind::InvalidData, None, Some(Box::new(e)))
}
