//! Defines the [`Post`] type, the unit of the blog directory.

use serde::{Deserialize, Serialize};

/// Represents a single blog post entry in the directory. Posts are keyed by
/// their source file name, which is unique within a source folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// The post's source file name, e.g., `post-a.md`.
    pub name: String,

    /// The post's one-line description. Serialized as `desc` since that's the
    /// key the front end reads.
    #[serde(default)]
    pub desc: String,

    /// The post's tags in the order they appear on the tags line.
    #[serde(default)]
    pub tags: Vec<String>,
}
