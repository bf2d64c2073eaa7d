//! Backing storage for templates.
//! A store knows which tags have a template group, which modes each group
//! offers, and how to fetch the raw source of a template or macro file.

use crate::constants::{MACROS_SUBDIR, TEMPLATES_SUBDIR, TEMPLATE_EXTENSION};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Trait for template storage backends.
pub trait TemplateStore: Debug + Send + Sync {
    /// Lists every tag that has a template group.
    fn groups(&self) -> Result<BTreeSet<String>>;

    /// Lists the compilation modes available for `tag`.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the tag has no group at all
    fn list_modes(&self, tag: &str) -> Result<BTreeSet<String>>;

    /// Fetches the source of a template (`<tag>/<mode>.jinja`) or of a macro file.
    /// Returns `Ok(None)` when nothing is stored under `name`.
    fn source(&self, name: &str) -> Result<Option<String>>;
}

/// Returns the loader name of the template for `(tag, mode)`.
pub fn template_name(tag: &str, mode: &str) -> String {
    format!("{tag}/{mode}.{TEMPLATE_EXTENSION}")
}

/// True when `segment` is a single, non-empty, relative path component.
pub(crate) fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

/// Template store laid out on disk:
///
/// ```text
/// <root>/templates/<tag>/<mode>.jinja
/// <root>/macros/<name>.jinja
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    templates_dir: PathBuf,
    macros_dir: PathBuf,
}

impl FileSystemStore {
    /// Opens the store rooted at `root`.
    ///
    /// # Errors
    /// * `Error::ConfigError` if `root` is not a directory
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::ConfigError(format!(
                "template store '{}' does not exist",
                root.display()
            )));
        }

        debug!("Using template store at {}", root.display());
        Ok(Self {
            templates_dir: root.join(TEMPLATES_SUBDIR),
            macros_dir: root.join(MACROS_SUBDIR),
        })
    }

    fn resolve(base: &Path, name: &str) -> Option<PathBuf> {
        let mut path = base.to_path_buf();
        for segment in name.split('/') {
            if !is_plain_segment(segment) {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

impl TemplateStore for FileSystemStore {
    fn groups(&self) -> Result<BTreeSet<String>> {
        if !self.templates_dir.is_dir() {
            return Ok(BTreeSet::new());
        }

        let mut groups = BTreeSet::new();
        for entry in WalkDir::new(&self.templates_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::IoError(e.into()))?;
            if entry.file_type().is_dir() {
                groups.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(groups)
    }

    fn list_modes(&self, tag: &str) -> Result<BTreeSet<String>> {
        let group_dir = match Self::resolve(&self.templates_dir, tag) {
            Some(dir) if is_plain_segment(tag) && dir.is_dir() => dir,
            _ => {
                return Err(Error::TemplateNotFound {
                    name: tag.to_string(),
                })
            }
        };

        let mut modes = BTreeSet::new();
        for entry in WalkDir::new(&group_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::IoError(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(TEMPLATE_EXTENSION)
            {
                continue;
            }
            if let Some(mode) = path.file_stem().and_then(|stem| stem.to_str()) {
                modes.insert(mode.to_string());
            }
        }
        Ok(modes)
    }

    fn source(&self, name: &str) -> Result<Option<String>> {
        for base in [&self.templates_dir, &self.macros_dir] {
            if let Some(path) = Self::resolve(base, name) {
                if path.is_file() {
                    debug!("Loading template {}", path.display());
                    return fs::read_to_string(&path).map(Some).map_err(Error::IoError);
                }
            }
        }
        Ok(None)
    }
}

/// In-memory template store, filled programmatically.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    groups: IndexMap<String, IndexMap<String, String>>,
    macros: IndexMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the template for `(tag, mode)`, replacing any previous one.
    pub fn insert<T, M, S>(&mut self, tag: T, mode: M, source: S) -> &mut Self
    where
        T: Into<String>,
        M: Into<String>,
        S: Into<String>,
    {
        self.groups.entry(tag.into()).or_default().insert(mode.into(), source.into());
        self
    }

    /// Registers a tag group with no templates in it.
    pub fn insert_group<T: Into<String>>(&mut self, tag: T) -> &mut Self {
        self.groups.entry(tag.into()).or_default();
        self
    }

    /// Stores a macro file, addressable from any template by `name`.
    pub fn insert_macro<N: Into<String>, S: Into<String>>(
        &mut self,
        name: N,
        source: S,
    ) -> &mut Self {
        self.macros.insert(name.into(), source.into());
        self
    }
}

impl TemplateStore for MemoryStore {
    fn groups(&self) -> Result<BTreeSet<String>> {
        Ok(self.groups.keys().cloned().collect())
    }

    fn list_modes(&self, tag: &str) -> Result<BTreeSet<String>> {
        self.groups
            .get(tag)
            .map(|modes| modes.keys().cloned().collect())
            .ok_or_else(|| Error::TemplateNotFound {
                name: tag.to_string(),
            })
    }

    fn source(&self, name: &str) -> Result<Option<String>> {
        let suffix = format!(".{TEMPLATE_EXTENSION}");
        if let Some((tag, file)) = name.split_once('/') {
            if let Some(mode) = file.strip_suffix(&suffix) {
                if let Some(source) = self.groups.get(tag).and_then(|modes| modes.get(mode)) {
                    return Ok(Some(source.clone()));
                }
            }
        }
        Ok(self.macros.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name() {
        assert_eq!(template_name("page", "html"), "page/html.jinja");
    }

    #[test]
    fn test_plain_segment() {
        assert!(is_plain_segment("page"));
        assert!(!is_plain_segment(".."));
        assert!(!is_plain_segment("a/b"));
        assert!(!is_plain_segment(""));
    }

    #[test]
    fn test_memory_store_lookup() {
        let mut store = MemoryStore::new();
        store
            .insert("page", "html", "<p/>")
            .insert_macro("util.jinja", "{% macro x() %}{% endmacro %}");

        assert_eq!(store.source("page/html.jinja").unwrap().as_deref(), Some("<p/>"));
        assert!(store.source("util.jinja").unwrap().is_some());
        assert!(store.source("page/css.jinja").unwrap().is_none());
        assert!(matches!(store.list_modes("nav"), Err(Error::TemplateNotFound { .. })));
    }
}
