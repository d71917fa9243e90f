//! Defines the [`Directory`] type, the persisted index of blog posts by tag,
//! along with the operations for loading, extending, querying, and persisting
//! it.
//!
//! On disk a directory is a single JSON object:
//!
//! ```json
//! {
//!   "files": [{"name": "post-a.md", "desc": "Hello world", "tags": ["intro", "go"]}],
//!   "tags": {"go": [0], "intro": [0]}
//! }
//! ```
//!
//! `files` is append-only; a post's position in it never changes once
//! assigned, which is what lets `tags` refer to posts by index.

use crate::metadata::Metadata;
use crate::post::Post;
use crate::tag::TagCount;
use crate::util::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// The index of known posts and the tag buckets which refer to them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// Every known post in discovery order.
    pub files: Vec<Post>,

    /// Maps each tag to the ascending indices of its posts in `files`.
    pub tags: BTreeMap<String, Vec<usize>>,
}

impl Directory {
    /// Loads a directory from `path`. A missing file or one which doesn't
    /// hold a valid directory yields an empty [`Directory`]; only other I/O
    /// failures (e.g., permissions) are errors, so that a run never replaces a
    /// file it couldn't read.
    pub fn load(path: &Path) -> Result<Directory> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "no directory at `{}`; starting empty",
                    path.display()
                );
                return Ok(Directory::default());
            }
            Err(e) => {
                return Err(Error::Annotated(
                    format!("reading directory `{}`", path.display()),
                    Box::new(Error::Io(e)),
                ))
            }
        };

        match Directory::from_slice(&contents) {
            Ok(directory) => Ok(directory),
            Err(e) => {
                log::warn!(
                    "discarding unreadable directory `{}`: {}",
                    path.display(),
                    e
                );
                Ok(Directory::default())
            }
        }
    }

    /// Deserializes and validates a directory from JSON bytes.
    pub fn from_slice(contents: &[u8]) -> Result<Directory> {
        let directory: Directory = serde_json::from_slice(contents)?;
        directory.validate()?;
        Ok(directory)
    }

    /// Checks the directory's invariants: post names are unique, and every
    /// tag bucket is strictly ascending and refers only to existing posts.
    pub fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for post in self.files.iter() {
            if !names.insert(post.name.as_str()) {
                return Err(Error::DuplicateName(post.name.clone()));
            }
        }

        for (tag, indices) in self.tags.iter() {
            if let Some(&index) = indices.iter().find(|&&i| i >= self.files.len()) {
                return Err(Error::DanglingIndex {
                    tag: tag.clone(),
                    index,
                    len: self.files.len(),
                });
            }
            if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::UnorderedBucket(tag.clone()));
            }
        }
        Ok(())
    }

    /// Serializes the directory to JSON.
    pub fn to_vec(&self, pretty: bool) -> Result<Vec<u8>> {
        Ok(match pretty {
            true => serde_json::to_vec_pretty(self)?,
            false => serde_json::to_vec(self)?,
        })
    }

    /// Writes the whole directory to `path`, replacing any prior content. The
    /// write is atomic: on failure the previous file is left untouched.
    pub fn persist(&self, path: &Path, pretty: bool) -> Result<()> {
        let contents = self.to_vec(pretty)?;
        write_atomic(path, &contents).map_err(|e| {
            Error::Annotated(
                format!("writing directory `{}`", path.display()),
                Box::new(Error::Io(e)),
            )
        })
    }

    /// Returns the candidates which aren't already indexed, preserving the
    /// candidates' order.
    pub fn filter_new<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known: BTreeSet<&str> =
            self.files.iter().map(|post| post.name.as_str()).collect();
        candidates
            .into_iter()
            .map(Into::into)
            .filter(|name| !known.contains(name.as_str()))
            .collect()
    }

    /// Appends a new post built from `name` and `metadata` and adds its index
    /// to each of its tags' buckets. Returns the post's index.
    /// Repeated tags keep only their first occurrence, both on the post and
    /// in the buckets.
    pub fn append(&mut self, name: &str, metadata: Metadata) -> usize {
        let index = self.files.len();
        let mut tags: Vec<String> = Vec::with_capacity(metadata.tags.len());
        for tag in metadata.tags {
            if !tags.contains(&tag) {
                self.tags
                    .entry(tag.clone())
                    .or_insert_with(Vec::new)
                    .push(index);
                tags.push(tag);
            }
        }
        self.files.push(Post {
            name: name.to_owned(),
            desc: metadata.desc,
            tags,
        });
        index
    }

    /// Returns each tag with the size of its bucket, ordered by tag name.
    pub fn tag_counts(&self) -> Vec<TagCount> {
        self.tags
            .iter()
            .map(|(tag, indices)| TagCount {
                tag: tag.clone(),
                count: indices.len(),
            })
            .collect()
    }

    /// Returns the posts carrying `tag` in index order. Unknown tags yield no
    /// posts.
    pub fn files_by_tag(&self, tag: &str) -> Vec<&Post> {
        match self.tags.get(tag) {
            None => Vec::new(),
            Some(indices) => indices
                .iter()
                .filter_map(|&index| self.files.get(index))
                .collect(),
        }
    }

    /// Returns the size of the largest tag bucket, or 0 if there are no tags.
    pub fn max_tag_count(&self) -> usize {
        self.tags.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the first post named `name`, if any.
    pub fn find_file_by_name(&self, name: &str) -> Option<&Post> {
        self.files.iter().find(|post| post.name == name)
    }
}

/// Lists the names of the regular files directly inside `source_directory`
/// which end with `extension`, sorted by name. Symlinks to files count as
/// files. Subdirectories are not searched, and names which aren't valid UTF-8
/// are skipped with a warning.
pub fn discover_candidates(
    source_directory: &Path,
    extension: &str,
) -> Result<BTreeSet<String>> {
    use walkdir::WalkDir;

    let mut candidates = BTreeSet::new();
    for result in WalkDir::new(source_directory).min_depth(1).max_depth(1) {
        let entry = result.map_err(|e| Error::ListSource {
            path: source_directory.to_owned(),
            err: e,
        })?;
        // `Path::is_file` follows symlinks; `DirEntry::file_type` doesn't.
        if !entry.path().is_file() {
            continue;
        }
        let file_name = match entry.file_name().to_str() {
            Some(file_name) => file_name,
            None => {
                log::warn!(
                    "skipping `{}`: file name isn't valid UTF-8",
                    entry.path().display()
                );
                continue;
            }
        };
        if file_name.ends_with(extension) {
            candidates.insert(file_name.to_owned());
        } else {
            log::debug!("ignoring `{}`", entry.path().display());
        }
    }
    Ok(candidates)
}

/// Represents the result of a fallible [`Directory`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading, validating, or persisting a [`Directory`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a tag bucket refers to a post which doesn't exist.
    DanglingIndex { tag: String, index: usize, len: usize },

    /// Returned when a tag bucket repeats an index or isn't in ascending
    /// order.
    UnorderedBucket(String),

    /// Returned when two posts share a name.
    DuplicateName(String),

    /// Returned when the directory can't be converted to or from JSON.
    Json(serde_json::Error),

    /// Returned when the source directory can't be listed.
    ListSource { path: PathBuf, err: walkdir::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DanglingIndex { tag, index, len } => write!(
                f,
                "tag `{}` refers to post {} but there are only {} posts",
                tag, index, len
            ),
            Error::UnorderedBucket(tag) => {
                write!(f, "tag `{}` has repeated or unordered post indices", tag)
            }
            Error::DuplicateName(name) => {
                write!(f, "post `{}` appears more than once", name)
            }
            Error::Json(err) => err.fmt(f),
            Error::ListSource { path, err } => {
                write!(f, "listing source directory '{}': {}", path.display(), err)
            }
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
            Error::DanglingIndex { .. } => None,
            Error::UnorderedBucket(_) => None,
            Error::DuplicateName(_) => None,
            Error::Json(err) => Some(err),
            Error::ListSource { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_json`] functions.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn metadata(desc: &str, tags: &[&str]) -> Metadata {
        Metadata {
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            desc: desc.to_owned(),
        }
    }

    fn sample() -> Directory {
        let mut directory = Directory::default();
        directory.append("post-a.md", metadata("Hello world", &["intro", "go"]));
        directory.append("post-b.md", metadata("More go", &["go"]));
        directory.append("post-c.md", metadata("Untagged", &[]));
        directory
    }

    #[test]
    fn test_append_assigns_indices_and_buckets() {
        let directory = sample();
        assert_eq!(3, directory.files.len());
        assert_eq!(Some(&vec![0, 1]), directory.tags.get("go"));
        assert_eq!(Some(&vec![0]), directory.tags.get("intro"));
        assert_eq!(2, directory.tags.len());
    }

    #[test]
    fn test_append_collapses_repeated_tag() {
        let mut directory = Directory::default();
        directory.append("dup.md", metadata("", &["go", "rust", "go"]));
        assert_eq!(Some(&vec![0]), directory.tags.get("go"));
        assert_eq!(
            vec![String::from("go"), String::from("rust")],
            directory.files[0].tags
        );
        assert!(directory.validate().is_ok());
    }

    #[test]
    fn test_tag_counts_sorted_by_tag() {
        assert_eq!(
            vec![
                TagCount { tag: String::from("go"), count: 2 },
                TagCount { tag: String::from("intro"), count: 1 },
            ],
            sample().tag_counts(),
        );
    }

    #[test]
    fn test_files_by_tag_matches_bucket_sizes() {
        let directory = sample();
        for (tag, indices) in directory.tags.iter() {
            assert_eq!(indices.len(), directory.files_by_tag(tag).len());
        }
        let names: Vec<&str> = directory
            .files_by_tag("go")
            .iter()
            .map(|post| post.name.as_str())
            .collect();
        assert_eq!(vec!["post-a.md", "post-b.md"], names);
    }

    #[test]
    fn test_files_by_unknown_tag_is_empty() {
        assert!(sample().files_by_tag("rust").is_empty());
    }

    #[test]
    fn test_max_tag_count() {
        assert_eq!(2, sample().max_tag_count());
        assert_eq!(0, Directory::default().max_tag_count());
    }

    #[test]
    fn test_find_file_by_name() {
        let directory = sample();
        assert_eq!(
            Some("More go"),
            directory
                .find_file_by_name("post-b.md")
                .map(|post| post.desc.as_str()),
        );
        assert_eq!(None, directory.find_file_by_name("post-z.md"));
    }

    #[test]
    fn test_filter_new() {
        let directory = sample();
        assert_eq!(
            vec![String::from("post-d.md")],
            directory.filter_new(vec!["post-a.md", "post-d.md", "post-c.md"]),
        );
    }

    #[test]
    fn test_serialized_shape() -> Result<()> {
        let mut directory = Directory::default();
        directory.append("post-a.md", metadata("Hello world", &["intro", "go"]));
        assert_eq!(
            r#"{"files":[{"name":"post-a.md","desc":"Hello world","tags":["intro","go"]}],"tags":{"go":[0],"intro":[0]}}"#,
            String::from_utf8(directory.to_vec(false)?).unwrap(),
        );
        Ok(())
    }

    #[test]
    fn test_persist_then_load_is_lossless() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("directory.json");
        let directory = sample();
        directory.persist(&path, false)?;
        let loaded = Directory::load(&path)?;
        assert_eq!(directory, loaded);

        loaded.persist(&path, false)?;
        assert_eq!(directory.to_vec(false)?, fs::read(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_missing_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(
            Directory::default(),
            Directory::load(&dir.path().join("absent.json"))?,
        );
        Ok(())
    }

    #[test]
    fn test_load_corrupt_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("directory.json");
        fs::write(&path, "{ not json")?;
        assert_eq!(Directory::default(), Directory::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_dangling_index_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("directory.json");
        fs::write(&path, r#"{"files":[],"tags":{"go":[0]}}"#)?;
        assert_eq!(Directory::default(), Directory::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_duplicate_index_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("directory.json");
        fs::write(
            &path,
            r#"{"files":[{"name":"a.md","desc":"","tags":["go"]}],"tags":{"go":[0,0]}}"#,
        )?;
        assert_eq!(Directory::default(), Directory::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_from_slice_rejects_unordered_bucket() {
        let input = br#"{"files":[{"name":"a.md"},{"name":"b.md"}],"tags":{"go":[1,0]}}"#;
        match Directory::from_slice(input) {
            Err(Error::UnorderedBucket(tag)) => assert_eq!("go", tag),
            other => panic!("wanted UnorderedBucket, got {:?}", other),
        }
    }

    #[test]
    fn test_from_slice_rejects_duplicate_name() {
        let input = br#"{"files":[{"name":"a.md"},{"name":"a.md"}],"tags":{}}"#;
        match Directory::from_slice(input) {
            Err(Error::DuplicateName(name)) => assert_eq!("a.md", name),
            other => panic!("wanted DuplicateName, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_dangling_index() {
        let mut directory = sample();
        directory.tags.insert(String::from("ghost"), vec![7]);
        match directory.validate() {
            Err(Error::DanglingIndex { tag, index, len }) => {
                assert_eq!(("ghost", 7, 3), (tag.as_str(), index, len));
            }
            other => panic!("wanted DanglingIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_candidates_filters_and_sorts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("b.md"), "")?;
        fs::write(dir.path().join("a.md"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        fs::create_dir(dir.path().join("drafts.md"))?;
        fs::write(dir.path().join("drafts.md").join("c.md"), "")?;

        let candidates = discover_candidates(dir.path(), ".md")?;
        assert_eq!(
            vec!["a.md", "b.md"],
            candidates.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_candidates_follows_symlinks() -> Result<()> {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir()?;
        let elsewhere = tempfile::tempdir()?;
        fs::write(dir.path().join("plain.md"), "")?;
        fs::write(elsewhere.path().join("real.md"), "")?;
        symlink(elsewhere.path().join("real.md"), dir.path().join("linked.md"))?;
        symlink(elsewhere.path(), dir.path().join("folder.md"))?;

        let candidates = discover_candidates(dir.path(), ".md")?;
        assert_eq!(
            vec!["linked.md", "plain.md"],
            candidates.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_discover_candidates_skips_non_utf8_names() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("good.md"), "")?;
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.md")), "")?;

        let candidates = discover_candidates(dir.path(), ".md")?;
        assert_eq!(
            vec!["good.md"],
            candidates.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        Ok(())
    }

    #[test]
    fn test_discover_candidates_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        match discover_candidates(&dir.path().join("absent"), ".md") {
            Err(Error::ListSource { .. }) => {}
            other => panic!("wanted ListSource, got {:?}", other),
        }
    }
}
