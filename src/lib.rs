//! Trellis compiles hierarchical documents through templates.
//! An XML or JSON tree becomes a tree of nodes, each node is rendered by the
//! template picked by its tag and a compilation mode, and the rendered
//! directory/file specification can then be materialized on disk.

/// Input adapters turning XML and JSON documents into node trees
pub mod adapter;

/// Materialization of infrastructure specifications on disk
pub mod builder;

/// Command-line interface module for the Trellis application
pub mod cli;

/// Configuration handling (trellis.json, trellis.yml, trellis.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the Trellis application
pub mod error;

/// Infrastructure specification model and its YAML/XML readers
pub mod infrastructure;

/// Logger setup for the binary
pub mod logger;

/// The compile tree and its rendering
pub mod node;

/// Stage orchestration: parse, validate, compile, write, build
pub mod pipeline;

/// Template stores and the repository that renders from them
pub mod templates;

/// JSON Schema validation of input trees
pub mod validator;
