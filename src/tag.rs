//! Defines the [`TagCount`] type, which summarizes a tag bucket of a
//! [`crate::directory::Directory`] for the presentation layer's tag cloud.

use serde::Serialize;
use std::fmt;

/// A tag together with the number of posts that carry it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// The tag's name, exactly as it appears in the source files.
    pub tag: String,

    /// The number of posts in the tag's bucket.
    pub count: usize,
}

impl fmt::Display for TagCount {
    /// Displays a [`TagCount`] as a tab-separated `tag` and `count` pair.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}", self.tag, self.count)
    }
}
