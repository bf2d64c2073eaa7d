//! Infrastructure specification.
//! The description of a directory/file tree that the builder materializes:
//! a project name, an output directory and a nested list of entries.
//! Readable from YAML (or JSON) and from XML.

use crate::adapter::{InputAdapter, XmlAdapter};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::templates::store::is_plain_segment;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory/file layout rooted at `output_dir/project_name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InfrastructureSpec {
    pub project_name: String,
    pub output_dir: PathBuf,
    pub structure: Vec<Entry>,
}

/// One directory or file of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Directory {
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        children: Vec<Entry>,
    },
    File {
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory { name, .. } | Entry::File { name, .. } => name,
        }
    }
}

// `children:` or `content:` with nothing after it reads as null in YAML.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl InfrastructureSpec {
    /// Parses a YAML (or JSON) specification.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::SpecificationError(format!("invalid specification: {e}")))
    }

    /// Parses an XML specification:
    ///
    /// ```xml
    /// <infrastructure>
    ///   <project_name>demo</project_name>
    ///   <output_dir>out</output_dir>
    ///   <structure>
    ///     <directory name="src">
    ///       <file name="main.txt"><content>hello</content></file>
    ///     </directory>
    ///   </structure>
    /// </infrastructure>
    /// ```
    pub fn from_xml(content: &str) -> Result<Self> {
        // File content is literal, so text is read without trimming.
        let root = XmlAdapter::raw().build(content).map_err(|e| match e {
            Error::ParseError(msg) => {
                Error::SpecificationError(format!("invalid specification: {msg}"))
            }
            other => other,
        })?;
        Self::from_node(&root)
    }

    /// Parses a specification, picking XML when the text starts with `<`.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('<') {
            Self::from_xml(content)
        } else {
            Self::from_yaml(content)
        }
    }

    /// Reads and parses a specification file. Files ending in `.xml` are read as
    /// XML, anything else goes through [`InfrastructureSpec::parse`].
    ///
    /// # Errors
    /// * `Error::SpecificationNotFound` if the file does not exist
    /// * `Error::SpecificationError` if it cannot be parsed or has the wrong shape
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::SpecificationNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!("Loading specification from {}", path.display());
        let content = fs::read_to_string(path).map_err(Error::IoError)?;
        let is_xml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if is_xml {
            Self::from_xml(&content)
        } else {
            Self::parse(&content)
        }
    }

    fn from_node(root: &Node) -> Result<Self> {
        let project_name = child_text(root, "project_name")?;
        let output_dir = PathBuf::from(child_text(root, "output_dir")?);
        let structure = child(root, "structure")
            .ok_or_else(|| Error::SpecificationError("missing 'structure'".to_string()))?
            .children()
            .map(entry_from_node)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            project_name,
            output_dir,
            structure,
        })
    }

    /// Checks every name in the specification before anything touches the disk.
    ///
    /// `project_name` and entry names must be single relative path segments:
    /// no separators, no `.` or `..`, not empty. Absolute or traversing names
    /// are rejected rather than rewritten.
    pub fn validate(&self) -> Result<()> {
        if !is_plain_segment(&self.project_name) {
            return Err(Error::SpecificationError(format!(
                "project_name '{}' is not a single path segment",
                self.project_name
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::SpecificationError("output_dir is empty".to_string()));
        }
        validate_entries(&self.structure, Path::new(&self.project_name))
    }

    /// Directory the structure is materialized into, relative to the build root.
    pub fn base_path(&self) -> PathBuf {
        self.output_dir.join(&self.project_name)
    }
}

fn child<'a>(node: &'a Node, tag: &str) -> Option<&'a Node> {
    node.children().find(|child| child.tag() == tag)
}

fn child_text(node: &Node, tag: &str) -> Result<String> {
    child(node, tag)
        .and_then(|child| child.value())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::SpecificationError(format!("missing '{tag}'")))
}

fn validate_entries(entries: &[Entry], parent: &Path) -> Result<()> {
    for entry in entries {
        if !is_plain_segment(entry.name()) {
            return Err(Error::SpecificationError(format!(
                "entry name '{}' under '{}' is not a single path segment",
                entry.name(),
                parent.display()
            )));
        }
        if let Entry::Directory { name, children } = entry {
            validate_entries(children, &parent.join(name))?;
        }
    }
    Ok(())
}

fn entry_from_node(node: &Node) -> Result<Entry> {
    let name = node
        .attribute("name")
        .and_then(|name| name.as_str())
        .ok_or_else(|| Error::SpecificationError(format!("<{}> entry has no name", node.tag())))?
        .to_string();

    match node.tag() {
        "directory" => Ok(Entry::Directory {
            name,
            children: node
                .children()
                .map(entry_from_node)
                .collect::<Result<Vec<_>>>()?,
        }),
        "file" => {
            let content = child(node, "content")
                .and_then(|content| content.value())
                .unwrap_or_default()
                .to_string();
            Ok(Entry::File { name, content })
        }
        other => Err(Error::SpecificationError(format!(
            "unknown entry <{other}> named '{name}', expected <directory> or <file>"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
project_name: demo
output_dir: out
structure:
  - type: directory
    name: src
    children:
      - type: file
        name: main.txt
        content: hello
  - type: directory
    name: empty
    children:
  - type: file
    name: README.md
"#;

    #[test]
    fn test_from_yaml() {
        let spec = InfrastructureSpec::from_yaml(YAML).unwrap();
        assert_eq!(spec.project_name, "demo");
        assert_eq!(spec.base_path(), PathBuf::from("out/demo"));
        assert_eq!(
            spec.structure,
            vec![
                Entry::Directory {
                    name: "src".to_string(),
                    children: vec![Entry::File {
                        name: "main.txt".to_string(),
                        content: "hello".to_string()
                    }],
                },
                Entry::Directory {
                    name: "empty".to_string(),
                    children: vec![]
                },
                Entry::File {
                    name: "README.md".to_string(),
                    content: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_from_xml_matches_yaml() {
        let xml = r#"<infrastructure>
            <project_name>demo</project_name>
            <output_dir>out</output_dir>
            <structure>
                <directory name="src"><file name="main.txt"><content>hello</content></file></directory>
                <directory name="empty"/>
                <file name="README.md"/>
            </structure>
        </infrastructure>"#;

        assert_eq!(
            InfrastructureSpec::parse(xml).unwrap(),
            InfrastructureSpec::from_yaml(YAML).unwrap()
        );
    }

    #[test]
    fn test_xml_content_is_literal() {
        let xml = "<infrastructure>\n  <project_name>\n    demo\n  </project_name>\n  \
                   <output_dir>out</output_dir>\n  <structure>\n    \
                   <file name=\"main.py\"><content>    indented()\n</content></file>\n  \
                   </structure>\n</infrastructure>";

        let spec = InfrastructureSpec::from_xml(xml).unwrap();
        assert_eq!(spec.project_name, "demo");
        assert_eq!(
            spec.structure,
            vec![Entry::File {
                name: "main.py".to_string(),
                content: "    indented()\n".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_keys() {
        let err = InfrastructureSpec::from_yaml("project_name: demo\nstructure: []").unwrap_err();
        assert!(matches!(err, Error::SpecificationError(_)));

        let err = InfrastructureSpec::from_xml(
            "<infrastructure><output_dir>o</output_dir></infrastructure>",
        )
        .unwrap_err();
        assert!(matches!(err, Error::SpecificationError(_)));
    }

    #[test]
    fn test_unknown_entry_type() {
        let yaml = "project_name: p\noutput_dir: o\nstructure:\n  - type: symlink\n    name: x\n";
        assert!(matches!(InfrastructureSpec::from_yaml(yaml), Err(Error::SpecificationError(_))));
    }

    #[test]
    fn test_validate_rejects_traversal() {
        for bad in ["..", "/etc", "a/b", ""] {
            let spec = InfrastructureSpec {
                project_name: "demo".to_string(),
                output_dir: PathBuf::from("out"),
                structure: vec![Entry::Directory {
                    name: "src".to_string(),
                    children: vec![Entry::File {
                        name: bad.to_string(),
                        content: String::new(),
                    }],
                }],
            };
            assert!(
                matches!(spec.validate(), Err(Error::SpecificationError(_))),
                "name {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_project_path() {
        let spec = InfrastructureSpec {
            project_name: "../demo".to_string(),
            output_dir: PathBuf::from("out"),
            structure: vec![],
        };
        assert!(spec.validate().is_err());
    }
}
