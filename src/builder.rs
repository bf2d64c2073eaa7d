//! Infrastructure builder.
//! Materializes an [`InfrastructureSpec`] on disk: directories are created or
//! reused, files are always (over)written with the specified content.

use crate::error::{Error, Result};
use crate::infrastructure::{Entry, InfrastructureSpec};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One entry materialized by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    /// A directory was created or reused
    Directory(PathBuf),
    /// A file was written
    File(PathBuf),
}

impl BuildStep {
    pub fn path(&self) -> &Path {
        match self {
            BuildStep::Directory(path) | BuildStep::File(path) => path,
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Directory(path) => write!(f, "Created directory: '{}'", path.display()),
            BuildStep::File(path) => write!(f, "Created file: '{}'", path.display()),
        }
    }
}

/// What a build did, in materialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// `root/output_dir/project_name`
    pub base_path: PathBuf,
    /// Every directory and file below the base path, in the order they were handled
    pub steps: Vec<BuildStep>,
}

impl BuildReport {
    /// Directories created or reused, base path excluded.
    pub fn directories(&self) -> impl Iterator<Item = &Path> + '_ {
        self.steps.iter().filter_map(|step| match step {
            BuildStep::Directory(path) => Some(path.as_path()),
            BuildStep::File(_) => None,
        })
    }

    /// Files written.
    pub fn files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.steps.iter().filter_map(|step| match step {
            BuildStep::File(path) => Some(path.as_path()),
            BuildStep::Directory(_) => None,
        })
    }
}

/// Builds specifications underneath a fixed root directory.
///
/// Not safe to run concurrently against the same `output_dir/project_name`;
/// callers must serialize builds per target.
#[derive(Debug, Clone)]
pub struct InfrastructureBuilder {
    root: PathBuf,
}

impl Default for InfrastructureBuilder {
    fn default() -> Self {
        Self::new(".")
    }
}

impl InfrastructureBuilder {
    /// Creates a builder resolving `output_dir` against `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Loads the specification at `path` and builds it.
    ///
    /// # Errors
    /// * `Error::SpecificationNotFound` if the file does not exist
    /// * everything [`InfrastructureBuilder::build`] can return
    pub fn build_from_file<P: AsRef<Path>>(&self, path: P) -> Result<BuildReport> {
        let spec = InfrastructureSpec::load(path)?;
        self.build(&spec)
    }

    /// Materializes `spec`.
    ///
    /// Names are checked up front, so a specification with an unsafe name
    /// never touches the disk. After that the first filesystem failure stops
    /// the build; whatever was already created stays in place.
    ///
    /// # Errors
    /// * `Error::SpecificationError` if a name is not a single path segment
    /// * `Error::FilesystemConflict` if a path is taken by an entry of the other kind
    /// * `Error::IoFailure` if a directory or file cannot be created
    pub fn build(&self, spec: &InfrastructureSpec) -> Result<BuildReport> {
        spec.validate()?;

        let base_path = self.root.join(spec.base_path());
        create_dir(&base_path)?;

        let mut report = BuildReport {
            base_path: base_path.clone(),
            ..Default::default()
        };
        create_structure(&base_path, &spec.structure, &mut report)?;

        info!(
            "Project structure generated in {} ({} directories, {} files)",
            base_path.display(),
            report.directories().count(),
            report.files().count()
        );
        Ok(report)
    }
}

fn create_structure(base_path: &Path, entries: &[Entry], report: &mut BuildReport) -> Result<()> {
    for entry in entries {
        match entry {
            Entry::Directory { name, children } => {
                let dir_path = base_path.join(name);
                create_dir(&dir_path)?;
                debug!("Created directory: {}", dir_path.display());
                report.steps.push(BuildStep::Directory(dir_path.clone()));

                create_structure(&dir_path, children, report)?;
            }
            Entry::File { name, content } => {
                let file_path = base_path.join(name);
                write_file(&file_path, content)?;
                debug!("Created file: {}", file_path.display());
                report.steps.push(BuildStep::File(file_path));
            }
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::FilesystemConflict {
            path: path.to_path_buf(),
            reason: "a file exists where a directory is expected".to_string(),
        });
    }
    fs::create_dir_all(path).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if path.is_dir() {
        return Err(Error::FilesystemConflict {
            path: path.to_path_buf(),
            reason: "a directory exists where a file is expected".to_string(),
        });
    }
    fs::write(path, content).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })
}
