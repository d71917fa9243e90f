//! Defines the [`Config`] type and the logic for loading it from a
//! `blogdir.yaml` project file. The project file is optional; every field has
//! a default and relative paths resolve against the directory which holds the
//! project file (or the working directory when there is none).
//!
//! ```yaml
//! source_directory: public/blog
//! directory_file: src/assets/blogs/directory.json
//! extension: .md
//! markers:
//!   tags: "tags:"
//!   description: "desc:"
//! tag_separator: ", "
//! missing_metadata: fail
//! pretty: false
//! ```

use crate::metadata::{
    Markers, DEFAULT_DESCRIPTION_MARKER, DEFAULT_TAGS_MARKER, DEFAULT_TAG_SEPARATOR,
};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "blogdir.yaml";

const DEFAULT_SOURCE_DIRECTORY: &str = "public/blog";
const DEFAULT_DIRECTORY_FILE: &str = "src/assets/blogs/directory.json";
const DEFAULT_EXTENSION: &str = ".md";

/// What to do with a source file which lacks a metadata marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMetadata {
    /// Abort the run without writing anything. Since indexed files are never
    /// reprocessed, this keeps a post from being indexed without its tags for
    /// good.
    Fail,

    /// Log a warning, treat the absent values as empty, and keep going.
    Skip,
}

impl Default for MissingMetadata {
    fn default() -> Self {
        MissingMetadata::Fail
    }
}

#[derive(Deserialize, Default)]
struct MarkerKeys {
    tags: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Default)]
struct Project {
    source_directory: Option<PathBuf>,
    directory_file: Option<PathBuf>,
    extension: Option<String>,

    #[serde(default)]
    markers: MarkerKeys,

    tag_separator: Option<String>,

    #[serde(default)]
    missing_metadata: MissingMetadata,

    #[serde(default)]
    pretty: bool,
}

/// Everything a run of the indexer needs to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The folder holding the markdown post sources.
    pub source_directory: PathBuf,

    /// The JSON file the directory is loaded from and persisted to.
    pub directory_file: PathBuf,

    /// Only files whose name ends with this are indexed.
    pub extension: String,

    /// The metadata marker keys and the tag separator.
    pub markers: Markers,

    /// The policy for source files which lack a marker.
    pub missing_metadata: MissingMetadata,

    /// Pretty-print the persisted JSON.
    pub pretty: bool,
}

impl Config {
    /// Returns the default configuration with paths resolved against `root`.
    pub fn with_root(root: &Path) -> Config {
        Config::from_project(Project::default(), root)
    }

    fn from_project(project: Project, root: &Path) -> Config {
        let markers = Markers {
            tags: project
                .markers
                .tags
                .unwrap_or_else(|| String::from(DEFAULT_TAGS_MARKER)),
            description: project
                .markers
                .description
                .unwrap_or_else(|| String::from(DEFAULT_DESCRIPTION_MARKER)),
            separator: project
                .tag_separator
                .unwrap_or_else(|| String::from(DEFAULT_TAG_SEPARATOR)),
        };
        Config {
            source_directory: root.join(
                project
                    .source_directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIRECTORY)),
            ),
            directory_file: root.join(
                project
                    .directory_file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY_FILE)),
            ),
            extension: project
                .extension
                .unwrap_or_else(|| String::from(DEFAULT_EXTENSION)),
            markers,
            missing_metadata: project.missing_metadata,
            pretty: project.pretty,
        }
    }

    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found. If there is none, returns the defaults resolved
    /// against `dir`.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(candidate) = current {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                log::debug!("using project file `{}`", path.display());
                return Config::from_project_file(&path);
            }
            current = candidate.parent();
        }
        log::debug!(
            "no `{}` found above `{}`; using defaults",
            PROJECT_FILE,
            dir.display()
        );
        Ok(Config::with_root(dir))
    }

    /// Loads the project file at `path`. Relative paths in the file resolve
    /// against the file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let annotate = |err: Error| {
            Error::Annotated(
                format!("loading project file `{}`", path.display()),
                Box::new(err),
            )
        };
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|e| annotate(Error::Io(e)))?;
        let project: Project = match contents.trim().is_empty() {
            true => Project::default(),
            false => serde_yaml::from_str(&contents)
                .map_err(|e| annotate(Error::DeserializeYaml(e)))?,
        };
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Config::from_project(project, root))
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file isn't valid YAML or has bad fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors reading the project file.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}
