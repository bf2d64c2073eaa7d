//! Command-line interface implementation for Trellis.
//! Provides argument parsing and help text formatting using clap.

use crate::config::PipelineConfig;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for Trellis.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Trellis: compile document trees through templates and scaffold the result",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing trellis.json, trellis.yml or trellis.yaml
    #[arg(short, long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an XML or JSON document into an infrastructure specification
    Compile(CompileArgs),

    /// Materialize an infrastructure specification on disk
    Build {
        /// Path to the YAML, JSON or XML specification
        #[arg(value_name = "SPEC")]
        spec: PathBuf,

        /// Directory the specification's output_dir is resolved against
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Compile a document and build the resulting specification
    Run {
        #[command(flatten)]
        compile: CompileArgs,

        /// Directory the specification's output_dir is resolved against
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// List template groups, or the modes available for one tag
    Modes {
        /// Tag whose modes to list
        #[arg(value_name = "TAG")]
        tag: Option<String>,

        /// Root of the template store
        #[arg(short, long, value_name = "DIR")]
        templates: Option<PathBuf>,
    },
}

/// Arguments shared by `compile` and `run`.
#[derive(clap::Args, Debug)]
pub struct CompileArgs {
    /// Input document (.xml or .json)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Root of the template store
    #[arg(short, long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Compilation mode of the root node
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Where to write the rendered specification
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Skip schema validation of the input tree
    #[arg(long)]
    pub no_validate: bool,
}

impl CompileArgs {
    /// Overrides configuration values with the ones given on the command line.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(templates) = &self.templates {
            config.templates_dir = templates.clone();
        }
        if let Some(mode) = &self.mode {
            config.default_mode = mode.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if self.no_validate {
            config.validate = false;
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument
                || e.kind() == ErrorKind::MissingSubcommand
            {
                Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help()
                    .unwrap();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
