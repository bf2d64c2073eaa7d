//! The compile tree.
//! A node carries a tag, its attributes and its children, and renders itself by
//! resolving the template for `(tag, mode)` in a [`TemplateRepository`].

use crate::constants::{RESERVED_KEYS, TEXT_ATTRIBUTE};
use crate::error::{Error, Result};
use crate::templates::TemplateRepository;
use indexmap::IndexMap;
use log::debug;
use minijinja::value::{from_args, Enumerator, Object, Value};
use minijinja::{ErrorKind, State};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Open-ended, ordered set of node attributes.
pub type Attributes = IndexMap<String, serde_json::Value>;

/// A single element of the compile tree.
///
/// Shape is fixed at construction. Children are owned by their parent; the
/// `Arc` only exists so templates can hold a handle to a child while it is
/// being rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    attributes: Attributes,
    children: Vec<Arc<Node>>,
}

impl Node {
    /// Creates a node from its parts.
    ///
    /// # Errors
    /// * `Error::ParseError` if an attribute uses one of the reserved keys `tag` or `children`
    pub fn new<S: Into<String>>(
        tag: S,
        attributes: Attributes,
        children: Vec<Node>,
    ) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::ParseError("node tag must not be empty".to_string()));
        }
        if let Some(key) = attributes.keys().find(|key| RESERVED_KEYS.contains(&key.as_str())) {
            return Err(Error::ParseError(format!(
                "attribute '{key}' on <{tag}> uses a reserved name"
            )));
        }

        Ok(Self {
            tag,
            attributes,
            children: children.into_iter().map(Arc::new).collect(),
        })
    }

    /// Creates a node without attributes or children.
    pub fn leaf<S: Into<String>>(tag: S) -> Result<Self> {
        Self::new(tag, Attributes::new(), Vec::new())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Text content of the source element, if it had any.
    pub fn value(&self) -> Option<&str> {
        self.attributes.get(TEXT_ATTRIBUTE).and_then(|v| v.as_str())
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.children.iter().map(|child| child.as_ref())
    }

    /// Renders this node at `mode`.
    ///
    /// The template sees the node's attributes plus `children`, a list of
    /// handles it may render in turn with `child.render("<mode>")`. Nothing
    /// is cached on the node, so every call renders from scratch.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the tag has no template group
    /// * `Error::InvalidMode` if the group has no template for `mode`
    /// * `Error::RenderError` if the template fails, including failures of nested renders
    pub fn render(&self, templates: &TemplateRepository, mode: &str) -> Result<String> {
        let available = templates.list_modes(&self.tag)?;
        if !available.contains(mode) {
            return Err(Error::InvalidMode {
                tag: self.tag.clone(),
                mode: mode.to_string(),
                available: available.into_iter().collect(),
            });
        }

        debug!("Rendering <{}> as '{}'", self.tag, mode);
        templates.resolve_and_render(&self.tag, mode, self.context(templates))
    }

    fn context(&self, templates: &TemplateRepository) -> Value {
        let mut context: BTreeMap<String, Value> = self
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();
        context.insert("children".to_string(), self.child_handles(templates));
        Value::from(context)
    }

    fn child_handles(&self, templates: &TemplateRepository) -> Value {
        let handles: Vec<Value> = self
            .children
            .iter()
            .map(|child| {
                Value::from_object(NodeHandle {
                    node: Arc::clone(child),
                    templates: templates.clone(),
                })
            })
            .collect();
        Value::from(handles)
    }
}

/// Serializes to the JSON tree shape: `tag`, `value`, `attributes`, `children`.
/// Empty collections and missing text are omitted.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = self.attributes.get(TEXT_ATTRIBUTE).filter(|v| v.is_string());
        let rest: IndexMap<&String, &serde_json::Value> = self
            .attributes
            .iter()
            .filter(|(key, v)| !(key.as_str() == TEXT_ATTRIBUTE && v.is_string()))
            .collect();

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tag", &self.tag)?;
        if let Some(value) = value {
            map.serialize_entry("value", value)?;
        }
        if !rest.is_empty() {
            map.serialize_entry("attributes", &rest)?;
        }
        if !self.children.is_empty() {
            let children: Vec<&Node> = self.children().collect();
            map.serialize_entry("children", &children)?;
        }
        map.end()
    }
}

/// What a template receives for each child.
#[derive(Debug)]
struct NodeHandle {
    node: Arc<Node>,
    templates: TemplateRepository,
}

impl Object for NodeHandle {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "tag" => Some(Value::from(self.node.tag.as_str())),
            "children" => Some(self.node.child_handles(&self.templates)),
            name => self.node.attributes.get(name).map(Value::from_serialize),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let mut keys = vec![Value::from("tag"), Value::from("children")];
        keys.extend(self.node.attributes.keys().map(|key| Value::from(key.as_str())));
        Enumerator::Values(keys)
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> std::result::Result<Value, minijinja::Error> {
        match method {
            "render" => {
                let (mode,): (&str,) = from_args(args)?;
                self.node.render(&self.templates, mode).map(Value::from_safe_string).map_err(|err| {
                    minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("cannot render <{}> as '{}'", self.node.tag, mode),
                    )
                    .with_source(err)
                })
            }
            "modes" => {
                if !args.is_empty() {
                    return Err(minijinja::Error::from(ErrorKind::TooManyArguments));
                }
                let modes = self.templates.list_modes(&self.node.tag).map_err(|err| {
                    minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("cannot list modes of <{}>", self.node.tag),
                    )
                    .with_source(err)
                })?;
                Ok(modes.into_iter().map(Value::from).collect())
            }
            _ => Err(minijinja::Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
