//! Commit a rendered builder tree to a storage backend.
//!
//! Structure first, links last: every group, dataset and attribute is
//! created in a depth-first walk while links are collected into a deferred
//! set keyed by their intended path; once the whole non-link structure
//! exists, soft links are stored as lazy path strings, hard links bind to
//! the recorded target handles, external links reference the other file
//! directly.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use crate::backend::{Backend, Mode};
use crate::builder::{GroupBuilder, LinkBuilder};
use crate::model::{ContainerId, Registry};
use crate::render::Renderer;
use crate::util::{Error, Result, Value};

struct DeferredLink<N> {
    parent: N,
    path: String,
    name: String,
    link: LinkBuilder,
}

/// Renders a file container and materializes it through a backend.
pub struct Writer<B: Backend> {
    backend: B,
    renderer: Renderer,
}

impl<B: Backend> Writer<B> {
    /// Writer with the standard renderer.
    pub fn new(backend: B) -> Self {
        Self { backend, renderer: Renderer::standard() }
    }

    /// Writer with a custom renderer (extension procedures, custom specs).
    pub fn with_renderer(backend: B, renderer: Renderer) -> Self {
        Self { backend, renderer }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Render `file` and commit it to `path`.
    ///
    /// Rendering happens before the backend file is opened, so every
    /// authoring error fires before any backend I/O. The handle is released
    /// whether the commit succeeds or not; on failure the on-disk artifact
    /// must be treated as corrupt.
    pub fn write(&mut self, reg: &Registry, file: ContainerId, path: impl AsRef<Path>) -> Result<()> {
        let builder = self.renderer.render(reg, file)?;
        debug!(path = %path.as_ref().display(), "writing builder tree");

        let mut handle = self.backend.open(path.as_ref(), Mode::Create)?;
        let committed = self.commit(&mut handle, &builder);
        let closed = self.backend.close(handle);
        committed.and(closed)
    }

    fn commit(&mut self, file: &mut B::File, root: &GroupBuilder) -> Result<()> {
        let root_node = self.backend.root(file)?;
        let mut nodes: HashMap<String, B::Node> = HashMap::new();
        nodes.insert(String::new(), root_node.clone());
        let mut deferred: Vec<DeferredLink<B::Node>> = Vec::new();

        self.commit_group(file, &root_node, "", root, &mut nodes, &mut deferred)?;

        debug!(links = deferred.len(), "resolving deferred links");
        for entry in deferred {
            match &entry.link {
                LinkBuilder::Soft(soft) => {
                    self.backend.create_soft_link(file, &entry.parent, &entry.name, &soft.path)?;
                }
                LinkBuilder::Hard(hard) => {
                    let target = nodes
                        .get(&hard.path)
                        .ok_or_else(|| Error::UnresolvedLink(hard.path.clone()))?
                        .clone();
                    self.backend.create_hard_link(file, &entry.parent, &entry.name, &target)?;
                }
                LinkBuilder::External(external) => {
                    self.backend.create_external_link(
                        file,
                        &entry.parent,
                        &entry.name,
                        &external.file_path,
                        &external.path,
                    )?;
                }
            }
            trace!(path = %join(&entry.path, &entry.name), "link created");
        }
        Ok(())
    }

    fn commit_group(
        &mut self,
        file: &mut B::File,
        node: &B::Node,
        path: &str,
        builder: &GroupBuilder,
        nodes: &mut HashMap<String, B::Node>,
        deferred: &mut Vec<DeferredLink<B::Node>>,
    ) -> Result<()> {
        for (name, value) in builder.attributes() {
            self.backend.set_attribute(file, node, name, value)?;
        }
        for (name, dataset) in builder.datasets() {
            let attributes: Vec<(String, Value)> = dataset
                .attributes()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            let created =
                self.backend.create_dataset(file, node, name, &dataset.data, &attributes)?;
            nodes.insert(join(path, name), created);
        }
        for (name, link) in builder.links() {
            deferred.push(DeferredLink {
                parent: node.clone(),
                path: path.to_string(),
                name: name.to_string(),
                link: link.clone(),
            });
        }
        for (name, sub) in builder.groups() {
            let created = self.backend.create_group(file, node, name)?;
            let child_path = join(path, name);
            nodes.insert(child_path.clone(), created.clone());
            self.commit_group(file, &created, &child_path, sub, nodes, deferred)?;
        }
        Ok(())
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}/{name}")
    }
}
