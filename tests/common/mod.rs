//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway blog project: a `public/blog` source folder and the default
/// directory file location, both under a temporary root.
pub struct Site {
    temp_dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("public/blog"))
            .expect("Failed to create source folder");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("public/blog")
    }

    pub fn directory_file(&self) -> PathBuf {
        self.root().join("src/assets/blogs/directory.json")
    }

    /// Writes a post source file.
    pub fn post(self, name: &str, contents: &str) -> Self {
        fs::write(self.source().join(name), contents).expect("Failed to write post");
        self
    }

    /// Copies one of the files under `testdata/posts` into the source folder.
    pub fn fixture(self, name: &str) -> Self {
        let from = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("testdata/posts")
            .join(name);
        fs::copy(&from, self.source().join(name)).expect("Failed to copy fixture");
        self
    }

    pub fn read_directory(&self) -> String {
        fs::read_to_string(self.directory_file()).expect("Failed to read directory file")
    }
}
