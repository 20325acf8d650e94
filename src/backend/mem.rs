//! In-memory hierarchical backend.
//!
//! Executable specification of the backend contract: files are node arenas
//! kept by the backend after close. Inspection helpers and a JSON
//! projection make written structure easy to assert against.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::util::{Error, Result, Value};

use super::{Backend, Mode};

/// Node kinds the in-memory file distinguishes.
#[derive(Clone, Debug, PartialEq)]
pub enum MemNodeKind {
    Group,
    Dataset(Value),
    SoftLink(String),
    /// Alias of another node in the same file, by node index.
    HardLink(usize),
    ExternalLink { file_path: String, path: String },
}

/// One node of an in-memory file.
#[derive(Clone, Debug, PartialEq)]
pub struct MemNode {
    pub name: String,
    pub kind: MemNodeKind,
    pub attributes: Vec<(String, Value)>,
    children: Vec<usize>,
}

impl MemNode {
    fn new(name: String, kind: MemNodeKind) -> Self {
        Self { name, kind, attributes: Vec::new(), children: Vec::new() }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// An open (or closed-and-retained) in-memory file.
#[derive(Clone, Debug, PartialEq)]
pub struct MemFile {
    path: PathBuf,
    nodes: Vec<MemNode>,
}

impl MemFile {
    fn new(path: PathBuf) -> Self {
        Self { path, nodes: vec![MemNode::new(String::new(), MemNodeKind::Group)] }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn add_node(&mut self, parent: usize, name: &str, kind: MemNodeKind) -> Result<usize> {
        let taken = self.nodes[parent]
            .children
            .iter()
            .any(|&c| self.nodes[c].name == name);
        if taken {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let id = self.nodes.len();
        self.nodes.push(MemNode::new(name.to_string(), kind));
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    fn child_by_name(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name == name)
    }

    /// Node at a '/'-separated path from the root; links are not followed.
    pub fn node_at(&self, path: &str) -> Option<&MemNode> {
        let mut cur = 0usize;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            cur = self.child_by_name(cur, part)?;
        }
        Some(&self.nodes[cur])
    }

    /// Dataset payload at a path.
    pub fn dataset(&self, path: &str) -> Option<&Value> {
        match &self.node_at(path)?.kind {
            MemNodeKind::Dataset(v) => Some(v),
            _ => None,
        }
    }

    /// Attribute on the node at a path ("" for the root).
    pub fn attribute(&self, path: &str, name: &str) -> Option<&Value> {
        self.node_at(path)?.attribute(name)
    }

    /// Target path of a soft link at a path.
    pub fn soft_link_target(&self, path: &str) -> Option<&str> {
        match &self.node_at(path)?.kind {
            MemNodeKind::SoftLink(target) => Some(target),
            _ => None,
        }
    }

    /// (file, path) target of an external link at a path.
    pub fn external_link_target(&self, path: &str) -> Option<(&str, &str)> {
        match &self.node_at(path)?.kind {
            MemNodeKind::ExternalLink { file_path, path: target } => {
                Some((file_path.as_str(), target.as_str()))
            }
            _ => None,
        }
    }

    /// Node a hard link at a path aliases.
    pub fn hard_link_target(&self, path: &str) -> Option<&MemNode> {
        match &self.node_at(path)?.kind {
            MemNodeKind::HardLink(target) => self.nodes.get(*target),
            _ => None,
        }
    }

    /// Project the whole file to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.node_json(0)
    }

    fn node_json(&self, id: usize) -> serde_json::Value {
        use serde_json::{json, Map};
        let node = &self.nodes[id];
        let mut out = Map::new();
        match &node.kind {
            MemNodeKind::Group => {
                out.insert("type".into(), json!("group"));
                let mut children = Map::new();
                for &c in &node.children {
                    children.insert(self.nodes[c].name.clone(), self.node_json(c));
                }
                out.insert("children".into(), children.into());
            }
            MemNodeKind::Dataset(v) => {
                out.insert("type".into(), json!("dataset"));
                out.insert("data".into(), v.to_json());
            }
            MemNodeKind::SoftLink(target) => {
                out.insert("type".into(), json!("soft_link"));
                out.insert("target".into(), json!(target));
            }
            MemNodeKind::HardLink(target) => {
                out.insert("type".into(), json!("hard_link"));
                out.insert("target".into(), json!(self.nodes[*target].name));
            }
            MemNodeKind::ExternalLink { file_path, path } => {
                out.insert("type".into(), json!("external_link"));
                out.insert("file".into(), json!(file_path));
                out.insert("target".into(), json!(path));
            }
        }
        if !node.attributes.is_empty() {
            let mut attrs = Map::new();
            for (k, v) in &node.attributes {
                attrs.insert(k.clone(), v.to_json());
            }
            out.insert("attributes".into(), attrs.into());
        }
        out.into()
    }

    /// Write the JSON projection, pretty-printed.
    pub fn dump(&self, writer: impl io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())
            .map_err(|e| Error::Backend(e.to_string()))
    }
}

/// In-memory backend keeping every closed file for inspection.
#[derive(Default)]
pub struct MemBackend {
    files: HashMap<PathBuf, MemFile>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file retained at close time.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&MemFile> {
        self.files.get(path.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Backend for MemBackend {
    type File = MemFile;
    type Node = usize;

    fn open(&mut self, path: &Path, mode: Mode) -> Result<Self::File> {
        match mode {
            Mode::Create => Ok(MemFile::new(path.to_path_buf())),
            Mode::Append => Ok(self
                .files
                .remove(path)
                .unwrap_or_else(|| MemFile::new(path.to_path_buf()))),
        }
    }

    fn root(&mut self, _file: &mut Self::File) -> Result<Self::Node> {
        Ok(0)
    }

    fn create_group(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
    ) -> Result<Self::Node> {
        file.add_node(*parent, name, MemNodeKind::Group)
    }

    fn create_dataset(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        payload: &Value,
        attributes: &[(String, Value)],
    ) -> Result<Self::Node> {
        let id = file.add_node(*parent, name, MemNodeKind::Dataset(payload.clone()))?;
        file.nodes[id].attributes.extend(attributes.iter().cloned());
        Ok(id)
    }

    fn set_attribute(
        &mut self,
        file: &mut Self::File,
        target: &Self::Node,
        name: &str,
        value: &Value,
    ) -> Result<()> {
        let attrs = &mut file.nodes[*target].attributes;
        for (k, v) in attrs.iter_mut() {
            if k == name {
                *v = value.clone();
                return Ok(());
            }
        }
        attrs.push((name.to_string(), value.clone()));
        Ok(())
    }

    fn create_soft_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target_path: &str,
    ) -> Result<()> {
        file.add_node(*parent, name, MemNodeKind::SoftLink(target_path.to_string()))?;
        Ok(())
    }

    fn create_hard_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target: &Self::Node,
    ) -> Result<()> {
        file.add_node(*parent, name, MemNodeKind::HardLink(*target))?;
        Ok(())
    }

    fn create_external_link(
        &mut self,
        file: &mut Self::File,
        parent: &Self::Node,
        name: &str,
        target_file: &str,
        target_path: &str,
    ) -> Result<()> {
        file.add_node(
            *parent,
            name,
            MemNodeKind::ExternalLink {
                file_path: target_file.to_string(),
                path: target_path.to_string(),
            },
        )?;
        Ok(())
    }

    fn close(&mut self, file: Self::File) -> Result<()> {
        self.files.insert(file.path.clone(), file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_child_rejected() {
        let mut file = MemFile::new(PathBuf::from("t.nwb"));
        file.add_node(0, "a", MemNodeKind::Group).unwrap();
        let err = file.add_node(0, "a", MemNodeKind::Group).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn test_path_lookup_and_json() {
        let mut backend = MemBackend::new();
        let mut file = backend.open(Path::new("t.nwb"), Mode::Create).unwrap();
        let root = backend.root(&mut file).unwrap();
        let grp = backend.create_group(&mut file, &root, "acquisition").unwrap();
        backend
            .create_dataset(
                &mut file,
                &grp,
                "data",
                &Value::FloatList(vec![1.0, 2.0]),
                &[("unit".to_string(), Value::Str("Volts".into()))],
            )
            .unwrap();
        backend.close(file).unwrap();

        let file = backend.file("t.nwb").unwrap();
        assert_eq!(file.dataset("acquisition/data"), Some(&Value::FloatList(vec![1.0, 2.0])));
        assert_eq!(
            file.attribute("acquisition/data", "unit"),
            Some(&Value::Str("Volts".to_string()))
        );
        let json = file.to_json();
        assert_eq!(json["children"]["acquisition"]["children"]["data"]["type"], "dataset");
    }
}
