//! Template repository.
//! Resolves `(tag, mode)` to a template held by a [`TemplateStore`] and renders it
//! with MiniJinja under strict-undefined semantics.

use crate::error::{Error, Result};
use log::debug;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub mod store;

pub use store::{template_name, FileSystemStore, MemoryStore, TemplateStore};

/// Shared handle to a template store and the MiniJinja environment bound to it.
///
/// Cloning is cheap; clones share the compiled-template cache. Templates are
/// compiled on first use and kept for the lifetime of the repository. Call
/// [`TemplateRepository::clear_cache`] to pick up changes made to the store.
#[derive(Clone)]
pub struct TemplateRepository {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn TemplateStore>,
    env: Environment<'static>,
}

impl fmt::Debug for TemplateRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRepository").field("store", &self.inner.store).finish()
    }
}

impl TemplateRepository {
    /// Creates a repository over any store.
    pub fn new<S: TemplateStore + 'static>(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Creates a repository over the on-disk store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self::new(FileSystemStore::open(root)?))
    }

    fn from_shared(store: Arc<dyn TemplateStore>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let loader_store = Arc::clone(&store);
        env.set_loader(move |name| {
            loader_store.source(name).map_err(|err| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("failed to load template '{name}'"),
                )
                .with_source(err)
            })
        });

        Self {
            inner: Arc::new(Inner { store, env }),
        }
    }

    /// Drops every compiled template so the next render reads the store again.
    /// Clones made before the call keep their own cache.
    pub fn clear_cache(&mut self) {
        debug!("Clearing template cache");
        *self = Self::from_shared(Arc::clone(&self.inner.store));
    }

    /// Lists every tag that has a template group.
    pub fn groups(&self) -> Result<BTreeSet<String>> {
        self.inner.store.groups()
    }

    /// Lists the compilation modes available for `tag`.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the tag has no template group
    pub fn list_modes(&self, tag: &str) -> Result<BTreeSet<String>> {
        self.inner.store.list_modes(tag)
    }

    /// Renders the template for `(tag, mode)` against `context`.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the template is not in the store
    /// * `Error::RenderError` on a syntax error or an undefined variable
    pub fn resolve_and_render<S: serde::Serialize>(
        &self,
        tag: &str,
        mode: &str,
        context: S,
    ) -> Result<String> {
        let name = template_name(tag, mode);
        let template = self
            .inner
            .env
            .get_template(&name)
            .map_err(|source| match source.kind() {
                ErrorKind::TemplateNotFound => Error::TemplateNotFound { name: name.clone() },
                _ => Error::RenderError {
                    template: name.clone(),
                    source,
                },
            })?;

        debug!("Rendering template {name}");
        template.render(context).map_err(|source| Error::RenderError {
            template: name,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository() -> TemplateRepository {
        let mut store = MemoryStore::new();
        store
            .insert("page", "html", "<h1>{{ title }}</h1>")
            .insert("page", "broken", "{% if %}")
            .insert("page", "macro", "{% import 'tags.jinja' as t %}{{ t.bold(title) }}")
            .insert_macro("tags.jinja", "{% macro bold(s) %}<b>{{ s }}</b>{% endmacro %}");
        TemplateRepository::new(store)
    }

    #[test]
    fn test_render_with_context() {
        let out = repository()
            .resolve_and_render("page", "html", json!({"title": "Hi"}))
            .unwrap();
        assert_eq!(out, "<h1>Hi</h1>");
    }

    #[test]
    fn test_clear_cache_rereads_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let group = temp_dir.path().join("templates/page");
        std::fs::create_dir_all(&group).unwrap();
        std::fs::write(group.join("html.jinja"), "v1").unwrap();

        let mut templates = TemplateRepository::open(temp_dir.path()).unwrap();
        assert_eq!(templates.resolve_and_render("page", "html", json!({})).unwrap(), "v1");

        std::fs::write(group.join("html.jinja"), "v2").unwrap();
        assert_eq!(templates.resolve_and_render("page", "html", json!({})).unwrap(), "v1");

        templates.clear_cache();
        assert_eq!(templates.resolve_and_render("page", "html", json!({})).unwrap(), "v2");
    }

    #[test]
    fn test_missing_variable_is_render_error() {
        let err = repository()
            .resolve_and_render("page", "html", json!({}))
            .unwrap_err();
        match err {
            Error::RenderError { template, .. } => assert_eq!(template, "page/html.jinja"),
            other => panic!("Expected RenderError, got {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let err = repository()
            .resolve_and_render("page", "broken", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::RenderError { .. }));
    }

    #[test]
    fn test_missing_mode_is_not_found() {
        let err = repository()
            .resolve_and_render("page", "css", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn test_macros_are_shared() {
        let out = repository()
            .resolve_and_render("page", "macro", json!({"title": "x"}))
            .unwrap();
        assert_eq!(out, "<b>x</b>");
    }

    #[test]
    fn test_no_html_escaping() {
        let out = repository()
            .resolve_and_render("page", "html", json!({"title": "a & b"}))
            .unwrap();
        assert_eq!(out, "<h1>a & b</h1>");
    }
}
