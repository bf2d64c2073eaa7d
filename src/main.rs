//! Trellis' main application entry point.
//! Parses the command line, loads the configuration and dispatches to the pipeline.

use std::path::PathBuf;

use trellis::{
    builder::{BuildReport, InfrastructureBuilder},
    cli::{get_args, Args, Command},
    config::get_config,
    error::{default_error_handler, Error, Result, Stage},
    logger::init_logger,
    pipeline::{read_input, Pipeline},
    templates::TemplateRepository,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn print_report(report: &BuildReport) {
    for step in &report.steps {
        println!("{step}");
    }
    println!("Project structure generated in {}.", report.base_path.display());
}

fn run(args: Args) -> Result<()> {
    let config_dir = args.config.unwrap_or_else(|| PathBuf::from("."));
    let mut config = get_config(&config_dir)?;

    match args.command {
        Command::Compile(compile) => {
            compile.apply(&mut config);
            let pipeline = Pipeline::new(config)?;
            let (source, format) = read_input(&compile.input).map_err(|e| e.at(Stage::Parse))?;
            let output = pipeline.compile_source(&source, format, None)?;
            println!("File generated at: {}", output.display());
        }
        Command::Build { spec, root } => {
            let builder = InfrastructureBuilder::new(root.unwrap_or(config.build_root));
            let report = builder.build_from_file(spec).map_err(|e| e.at(Stage::Build))?;
            print_report(&report);
        }
        Command::Run { compile, root } => {
            compile.apply(&mut config);
            if let Some(root) = root {
                config.build_root = root;
            }
            let pipeline = Pipeline::new(config)?;
            let outcome = pipeline.run_file(&compile.input, None)?;
            println!("File generated at: {}", outcome.spec_path.display());
            print_report(&outcome.report);
        }
        Command::Modes { tag, templates } => {
            let repository = TemplateRepository::open(templates.unwrap_or(config.templates_dir))?;
            match tag {
                Some(tag) => {
                    for mode in repository.list_modes(&tag)? {
                        println!("{mode}");
                    }
                }
                None => {
                    let groups = repository.groups()?;
                    if groups.is_empty() {
                        return Err(Error::ConfigError("template store has no groups".to_string()));
                    }
                    for group in groups {
                        let modes: Vec<String> =
                            repository.list_modes(&group)?.into_iter().collect();
                        println!("{group}: {}", modes.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}
