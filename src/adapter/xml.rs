use crate::adapter::{normalize_text, InputAdapter};
use crate::constants::TEXT_ATTRIBUTE;
use crate::error::{Error, Result};
use crate::node::{Attributes, Node};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An element whose end tag has not been seen yet.
struct OpenElement {
    tag: String,
    attributes: Attributes,
    text: String,
    children: Vec<Node>,
}

impl OpenElement {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let tag = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::ParseError(format!("element name is not UTF-8: {e}")))?
            .to_string();

        let mut attributes = Attributes::new();
        for attr in start.attributes() {
            let attr =
                attr.map_err(|e| Error::ParseError(format!("bad attribute on <{tag}>: {e}")))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::ParseError(format!("attribute name is not UTF-8: {e}")))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::ParseError(format!("bad value for '{key}' on <{tag}>: {e}")))?;
            attributes.insert(key, serde_json::Value::String(value.into_owned()));
        }

        Ok(Self {
            tag,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn close(self, text_mode: TextMode) -> Result<Node> {
        let text = match text_mode {
            TextMode::Normalized => normalize_text(&self.text),
            // Whitespace before the first child element is layout, not content.
            TextMode::Raw if !self.children.is_empty() && self.text.trim().is_empty() => None,
            TextMode::Raw if self.text.is_empty() => None,
            TextMode::Raw => Some(self.text),
        };

        let mut attributes = Attributes::new();
        if let Some(text) = text {
            if self.attributes.contains_key(TEXT_ATTRIBUTE) {
                return Err(Error::ParseError(format!(
                    "<{}> has both text content and a '{TEXT_ATTRIBUTE}' attribute",
                    self.tag
                )));
            }
            attributes.insert(TEXT_ATTRIBUTE.to_string(), serde_json::Value::String(text));
        }
        attributes.extend(self.attributes);

        Node::new(self.tag, attributes, self.children)
    }
}

/// How element text is turned into the `value` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextMode {
    /// Trimmed; whitespace-only text is dropped
    #[default]
    Normalized,
    /// Kept byte for byte
    Raw,
}

/// Builds nodes from an XML element tree.
///
/// Element names become tags and attributes are copied verbatim as strings.
/// The text that comes before an element's first child (CDATA included)
/// becomes its `value` attribute; text after a child element is ignored.
/// Comments, processing instructions and declarations are ignored.
#[derive(Debug, Default)]
pub struct XmlAdapter {
    text_mode: TextMode,
}

impl XmlAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter that keeps element text exactly as written.
    pub fn raw() -> Self {
        Self {
            text_mode: TextMode::Raw,
        }
    }
}

fn attach(stack: &mut [OpenElement], root: &mut Option<Node>, node: Node) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_some() {
        return Err(Error::ParseError(format!(
            "document has more than one root element (second is <{}>)",
            node.tag()
        )));
    } else {
        *root = Some(node);
    }
    Ok(())
}

fn push_text(stack: &mut [OpenElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) if element.children.is_empty() => element.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => {
            return Err(Error::ParseError("text found outside of the root element".to_string()))
        }
    }
    Ok(())
}

impl InputAdapter for XmlAdapter {
    fn build(&self, source: &str) -> Result<Node> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::ParseError(format!("XML error at byte {}: {e}", reader.buffer_position()))
            })?;

            match event {
                Event::Start(start) => stack.push(OpenElement::open(&start)?),
                Event::Empty(start) => {
                    let node = OpenElement::open(&start)?.close(self.text_mode)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::ParseError("unexpected closing tag".to_string()))?;
                    let node = element.close(self.text_mode)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::ParseError(format!("bad text content: {e}")))?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data)
                        .map_err(|e| Error::ParseError(format!("CDATA is not UTF-8: {e}")))?;
                    push_text(&mut stack, text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = stack.last() {
            return Err(Error::ParseError(format!("element <{}> is never closed", element.tag)));
        }

        let root =
            root.ok_or_else(|| Error::ParseError("document has no root element".to_string()))?;
        debug!("Parsed XML document with root <{}>", root.tag());
        Ok(root)
    }
}
