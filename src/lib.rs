//! The library code for the `blogdir` blog indexer. A run can be broken down
//! into three steps:
//!
//! 1. Loading the persisted directory ([`crate::directory`])
//! 2. Parsing the metadata of post sources not yet in the directory
//!    ([`crate::metadata`]) and appending them
//! 3. Persisting the directory back to disk
//!
//! [`crate::build`] stitches these together. The directory is also the data
//! the blog's front end reads to render its tag cloud and per-tag post
//! listings; the query methods on [`crate::directory::Directory`] expose that
//! read side.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod directory;
pub mod metadata;
pub mod post;
pub mod tag;
mod util;

pub use crate::build::{build_directory, Options, Report};
pub use crate::config::{Config, MissingMetadata};
pub use crate::directory::Directory;
pub use crate::post::Post;
pub use crate::tag::TagCount;
