//! Storage backend interface.
//!
//! The writer talks to any hierarchical-container backend through this
//! trait; the crate ships [`MemBackend`] as the reference implementation
//! used by the test suite.

mod mem;

pub use mem::*;

use std::path::Path;

use crate::util::{Result, Value};

/// File open mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Create a new file, replacing any existing content.
    Create,
    /// Open an existing file for extension, creating it if absent.
    Append,
}

/// Minimal contract a hierarchical-container backend must satisfy.
///
/// Handles are opaque: `File` is the open file resource, `Node` addresses a
/// created group or dataset inside it.
pub trait Backend {
    type File;
    type Node: Clone;

    fn open(&mut self, path: &Path, mode: Mode) -> Result<Self::File>;

    /// Handle of the file's root group.
    fn root(&mut self, file: &mut Self::File) -> Result<Self::Node>;

    fn create_group(&mut self, file: &mut Self::File, parent: &Self::Node, name: &str)
        -> Result<Self::Node>;

    fn create_dataset(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        payload: &Value,
        attributes: &[(String, Value)],
    ) -> Result<Self::Node>;

    fn set_attribute(
        &mut self,
        file: &mut Self::File,
        target: &Self::Node,
        name: &str,
        value: &Value,
    ) -> Result<()>;

    /// Path reference resolved lazily at read time; no existence check.
    fn create_soft_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target_path: &str,
    ) -> Result<()>;

    /// Strong alias of an object that already exists in this file.
    fn create_hard_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target: &Self::Node,
    ) -> Result<()>;

    /// Reference into another file; no existence check against this file.
    fn create_external_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target_file: &str,
        target_path: &str,
    ) -> Result<()>;

    fn close(&mut self, file: Self::File) -> Result<()>;
}
