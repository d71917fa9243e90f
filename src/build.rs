//! Exports the [`build_directory`] function which stitches together the steps
//! of a run: loading the persisted [`Directory`], discovering post sources,
//! parsing the metadata of the ones not yet indexed, appending them, and
//! persisting the result.

use crate::config::{Config, MissingMetadata};
use crate::directory::{discover_candidates, Directory, Error as DirectoryError};
use crate::metadata::{self, Error as MetadataError, Markers, Metadata};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-run options which aren't part of the project configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Do everything except persisting the directory.
    pub dry_run: bool,
}

/// Summarizes a run of [`build_directory`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// The source files appended to the directory, in processing order.
    pub added: Vec<String>,

    /// The subset of `added` which lacked a metadata marker and was indexed
    /// with empty values.
    pub skipped: Vec<String>,

    /// The number of posts in the directory after the run.
    pub total: usize,

    /// Whether the directory was written to disk.
    pub persisted: bool,
}

impl fmt::Display for Report {
    /// Displays a one-line summary of the run.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "added {} post(s), {} total", self.added.len(), self.total)?;
        if !self.skipped.is_empty() {
            write!(f, " ({} missing metadata)", self.skipped.len())?;
        }
        if !self.persisted {
            write!(f, " [dry run]")?;
        }
        Ok(())
    }
}

/// Runs the indexer described by `config`. The directory file is written once
/// at the end; if anything fails before then, it is left untouched.
pub fn build_directory(config: &Config, options: Options) -> Result<Report> {
    let mut directory = Directory::load(&config.directory_file)?;
    let report = update_directory(&mut directory, config)?;

    if options.dry_run {
        log::info!(
            "dry run; not writing `{}`",
            config.directory_file.display()
        );
        return Ok(report);
    }

    directory.persist(&config.directory_file, config.pretty)?;
    Ok(Report {
        persisted: true,
        ..report
    })
}

/// Appends every post source in `config.source_directory` which `directory`
/// doesn't already know about. Sources are processed in name order.
pub fn update_directory(directory: &mut Directory, config: &Config) -> Result<Report> {
    let candidates =
        discover_candidates(&config.source_directory, &config.extension)?;
    let mut report = Report::default();

    for name in directory.filter_new(candidates) {
        let path = config.source_directory.join(&name);
        let (metadata, complete) =
            read_metadata(&path, &config.markers, config.missing_metadata)?;
        let index = directory.append(&name, metadata);
        log::info!("indexed `{}` as post {}", name, index);
        if !complete {
            report.skipped.push(name.clone());
        }
        report.added.push(name);
    }

    report.total = directory.files.len();
    Ok(report)
}

/// Reads the metadata of the source file at `path`, applying the
/// missing-metadata `policy`. The returned flag is false when a marker was
/// absent and its value was left empty.
fn read_metadata(
    path: &Path,
    markers: &Markers,
    policy: MissingMetadata,
) -> Result<(Metadata, bool)> {
    let scan = metadata::scan_file(path, markers).map_err(|e| Error::ReadSource {
        path: path.to_owned(),
        err: e,
    })?;

    let missing = scan.missing(markers);
    if missing.is_empty() {
        return Ok((scan.or_empty(), true));
    }

    match policy {
        MissingMetadata::Fail => match scan.require(markers) {
            Ok(metadata) => Ok((metadata, true)),
            Err(err) => Err(Error::Metadata {
                path: path.to_owned(),
                err,
            }),
        },
        MissingMetadata::Skip => {
            log::warn!(
                "`{}` is missing {}; indexing it with empty values",
                path.display(),
                missing
                    .iter()
                    .map(|marker| format!("`{}`", marker))
                    .collect::<Vec<_>>()
                    .join(" and "),
            );
            Ok((scan.or_empty(), false))
        }
    }
}

/// Represents the result of a run.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Errors can come from the directory file, reading
/// source files, or parsing their metadata.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading or persisting the [`Directory`] or listing
    /// the source directory.
    Directory(DirectoryError),

    /// Returned when a source file can't be read as UTF-8 text.
    ReadSource { path: PathBuf, err: std::io::Error },

    /// Returned when a source file lacks a marker and the policy is
    /// [`MissingMetadata::Fail`].
    Metadata { path: PathBuf, err: MetadataError },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Directory(err) => err.fmt(f),
            Error::ReadSource { path, err } => {
                write!(f, "reading post '{}': {}", path.display(), err)
            }
            Error::Metadata { path, err } => {
                write!(f, "parsing post '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Directory(err) => Some(err),
            Error::ReadSource { path: _, err } => Some(err),
            Error::Metadata { path: _, err } => Some(err),
        }
    }
}

impl From<DirectoryError> for Error {
    /// Converts [`DirectoryError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DirectoryError) -> Error {
        Error::Directory(err)
    }
}
