//! Error handling for Trellis.
//! Defines the error taxonomy shared by every stage and the result alias used throughout.

use std::path::PathBuf;
use std::{fmt, io};
use thiserror::Error;

/// Names a pipeline stage so a failure can be reported with where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Validate,
    Compile,
    Write,
    Build,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Validate => "validate",
            Stage::Compile => "compile",
            Stage::Write => "write",
            Stage::Build => "build",
        };
        f.write_str(name)
    }
}

/// Custom error types for Trellis operations.
///
/// Every failure kind has its own variant so callers can tell them apart
/// without looking at messages.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The input document is structurally malformed
    #[error("Parse error: {0}.")]
    ParseError(String),

    /// No template group (or template file) exists under this name
    #[error("Template not found: '{name}'.")]
    TemplateNotFound { name: String },

    /// The tag has templates, but none for the requested mode
    #[error("Invalid mode '{mode}' for tag '{tag}' (available: {}).", .available.join(", "))]
    InvalidMode {
        tag: String,
        mode: String,
        available: Vec<String>,
    },

    /// Template syntax error or a strict-undefined violation
    #[error("Render error in template '{template}': {source}.")]
    RenderError {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// The infrastructure specification file does not exist
    #[error("Specification file not found: '{}'.", .path.display())]
    SpecificationNotFound { path: PathBuf },

    /// Missing keys, wrong entry shape or unsafe entry names
    #[error("Specification error: {0}.")]
    SpecificationError(String),

    /// A path is occupied by an entry of the wrong kind
    #[error("Filesystem conflict at '{}': {reason}.", .path.display())]
    FilesystemConflict { path: PathBuf, reason: String },

    /// A directory or file could not be created
    #[error("Failed to materialize '{}': {source}.", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input tree does not match the tree schema
    #[error("Validation error: {0}.")]
    ValidationError(String),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A failure surfaced by the pipeline, tagged with the stage that produced it
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attaches a stage name to this error.
    pub fn at(self, stage: Stage) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through any stage wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the error that started a failure, looking through stage wrappers
    /// and through render errors raised by nested `child.render(...)` calls.
    ///
    /// A child rendered at a mode it lacks surfaces as the parent's
    /// `RenderError`; this returns the child's `InvalidMode` instead.
    pub fn innermost_cause(&self) -> &Error {
        let root = self.root_cause();
        if let Error::RenderError { source, .. } = root {
            let mut cause = std::error::Error::source(source);
            while let Some(err) = cause {
                if let Some(inner) = err.downcast_ref::<Error>() {
                    return inner.innermost_cause();
                }
                cause = err.source();
            }
        }
        root
    }

    /// Returns the stage this error was raised in, if it went through the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
