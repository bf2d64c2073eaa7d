use crate::adapter::{normalize_text, InputAdapter};
use crate::constants::TEXT_ATTRIBUTE;
use crate::error::{Error, Result};
use crate::node::{Attributes, Node};
use serde::Deserialize;

/// One object of a JSON tree document.
#[derive(Debug, Deserialize)]
struct JsonNode {
    tag: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    children: Vec<JsonNode>,
}

impl JsonNode {
    fn into_node(self) -> Result<Node> {
        let mut attributes = Attributes::new();
        if let Some(text) = self.value.as_deref().and_then(normalize_text) {
            if self.attributes.contains_key(TEXT_ATTRIBUTE) {
                return Err(Error::ParseError(format!(
                    "<{}> has both a value and a '{TEXT_ATTRIBUTE}' attribute",
                    self.tag
                )));
            }
            attributes.insert(TEXT_ATTRIBUTE.to_string(), serde_json::Value::String(text));
        }
        attributes.extend(self.attributes);

        let children = self
            .children
            .into_iter()
            .map(JsonNode::into_node)
            .collect::<Result<Vec<_>>>()?;
        Node::new(self.tag, attributes, children)
    }
}

/// Builds nodes from JSON objects shaped `{tag, value, attributes, children}`.
/// The `attributes` mapping is flattened onto the node.
#[derive(Debug, Default)]
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Builds a tree from an already parsed JSON document.
    pub fn build_value(&self, value: serde_json::Value) -> Result<Node> {
        let root: JsonNode = serde_json::from_value(value)
            .map_err(|e| Error::ParseError(format!("invalid JSON tree: {e}")))?;
        root.into_node()
    }
}

impl InputAdapter for JsonAdapter {
    fn build(&self, source: &str) -> Result<Node> {
        let root: JsonNode = serde_json::from_str(source)
            .map_err(|e| Error::ParseError(format!("invalid JSON tree: {e}")))?;
        root.into_node()
    }
}
