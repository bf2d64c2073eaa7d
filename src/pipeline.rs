//! Pipeline orchestration.
//! Chains the stages of one invocation: parse the document into a node tree,
//! validate it, render the root at the requested mode, write the rendered
//! specification to disk, then build it. The first failing stage stops the
//! run and its error is tagged with the stage name.

use crate::adapter::{InputAdapter, InputFormat, JsonAdapter};
use crate::builder::{BuildReport, InfrastructureBuilder};
use crate::config::PipelineConfig;
use crate::error::{Error, Result, Stage};
use crate::node::Node;
use crate::templates::TemplateRepository;
use crate::validator::{SchemaValidator, TreeValidator};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a full compile-and-build run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Where the rendered specification was written
    pub spec_path: PathBuf,
    pub report: BuildReport,
}

/// One configured pipeline. Holds no state between runs beyond the compiled
/// templates cached by its repository.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    templates: TemplateRepository,
}

impl Pipeline {
    /// Creates a pipeline reading templates from `config.templates_dir`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let templates = TemplateRepository::open(&config.templates_dir)?;
        Ok(Self { config, templates })
    }

    /// Creates a pipeline over an existing repository; `templates_dir` is ignored.
    pub fn with_templates(config: PipelineConfig, templates: TemplateRepository) -> Self {
        Self { config, templates }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRepository {
        &self.templates
    }

    fn validator(&self) -> Result<Option<SchemaValidator>> {
        if !self.config.validate {
            return Ok(None);
        }
        let validator = match &self.config.schema {
            Some(path) => SchemaValidator::from_file(path)?,
            None => SchemaValidator::tree()?,
        };
        Ok(Some(validator))
    }

    /// Parses and validates a document.
    pub fn parse(&self, source: &str, format: InputFormat) -> Result<Node> {
        let validator = self.validator().map_err(|e| e.at(Stage::Validate))?;

        let root = match format {
            InputFormat::Json => {
                let tree: serde_json::Value = serde_json::from_str(source)
                    .map_err(|e| Error::ParseError(format!("invalid JSON: {e}")).at(Stage::Parse))?;
                if let Some(validator) = &validator {
                    validator.validate(&tree).map_err(|e| e.at(Stage::Validate))?;
                }
                JsonAdapter::new().build_value(tree).map_err(|e| e.at(Stage::Parse))?
            }
            InputFormat::Xml => {
                let root = format.adapter().build(source).map_err(|e| e.at(Stage::Parse))?;
                if let Some(validator) = &validator {
                    let tree = serde_json::to_value(&root)
                        .map_err(|e| Error::ParseError(e.to_string()).at(Stage::Validate))?;
                    validator.validate(&tree).map_err(|e| e.at(Stage::Validate))?;
                }
                root
            }
        };

        debug!("Built node tree with root <{}>", root.tag());
        Ok(root)
    }

    /// Renders `root` at `mode`, or at the configured default mode.
    pub fn compile(&self, root: &Node, mode: Option<&str>) -> Result<String> {
        let mode = mode.unwrap_or(self.config.default_mode.as_str());
        info!("Compiling <{}> as '{}'", root.tag(), mode);
        root.render(&self.templates, mode).map_err(|e| e.at(Stage::Compile))
    }

    /// Writes rendered text verbatim to the configured output path.
    pub fn write(&self, rendered: &str) -> Result<PathBuf> {
        let output = &self.config.output;
        write_output(output, rendered).map_err(|e| e.at(Stage::Write))?;
        info!("File generated at: {}", output.display());
        Ok(output.clone())
    }

    /// Builds the specification file at `spec_path` under the configured build root.
    pub fn build<P: AsRef<Path>>(&self, spec_path: P) -> Result<BuildReport> {
        InfrastructureBuilder::new(&self.config.build_root)
            .build_from_file(spec_path)
            .map_err(|e| e.at(Stage::Build))
    }

    /// Parses, compiles and writes, stopping before the build.
    pub fn compile_source(
        &self,
        source: &str,
        format: InputFormat,
        mode: Option<&str>,
    ) -> Result<PathBuf> {
        let root = self.parse(source, format)?;
        let rendered = self.compile(&root, mode)?;
        self.write(&rendered)
    }

    /// Runs every stage on an in-memory document.
    pub fn run(
        &self,
        source: &str,
        format: InputFormat,
        mode: Option<&str>,
    ) -> Result<PipelineOutcome> {
        let spec_path = self.compile_source(source, format, mode)?;
        let report = self.build(&spec_path)?;
        Ok(PipelineOutcome { spec_path, report })
    }

    /// Runs every stage on a document file, picking the format from its extension.
    pub fn run_file<P: AsRef<Path>>(
        &self,
        input: P,
        mode: Option<&str>,
    ) -> Result<PipelineOutcome> {
        let (source, format) = read_input(input).map_err(|e| e.at(Stage::Parse))?;
        self.run(&source, format, mode)
    }
}

/// Reads a document file and detects its format.
pub fn read_input<P: AsRef<Path>>(input: P) -> Result<(String, InputFormat)> {
    let input = input.as_ref();
    let format = InputFormat::from_path(input)?;
    debug!("Reading {} input from {}", format, input.display());
    let source = fs::read_to_string(input).map_err(Error::IoError)?;
    Ok((source, format))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| Error::IoFailure {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    fs::write(path, content).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })
}
