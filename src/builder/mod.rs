//! Builder intermediate representation of a hierarchical file.
//!
//! A builder tree describes the target file - groups, datasets, attributes
//! and links - independently of any concrete storage backend. Render
//! procedures produce partial [`GroupBuilder`] trees which are combined with
//! [`GroupBuilder::deep_merge`]; the writer walks the finished tree and
//! commits it.
//!
//! Names are unique per level across all four node namespaces, so a group,
//! a dataset, an attribute and a link can never collide under one parent.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::util::{Error, Result, Value};

/// Scalar or array attribute value.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeBuilder {
    pub value: Value,
}

impl AttributeBuilder {
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into() }
    }
}

type AttributePairs = SmallVec<[(String, AttributeBuilder); 4]>;

/// Attribute sets compare as sets: merge order is not structure.
fn attributes_eq(a: &AttributePairs, b: &AttributePairs) -> bool {
    a.len() == b.len()
        && a.iter().all(|(name, attr)| b.iter().any(|(n, other)| n == name && other == attr))
}

/// Dataset payload plus per-dataset attributes.
#[derive(Clone, Debug)]
pub struct DatasetBuilder {
    pub data: Value,
    attributes: AttributePairs,
}

impl PartialEq for DatasetBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && attributes_eq(&self.attributes, &other.attributes)
    }
}

impl DatasetBuilder {
    pub fn new(data: impl Into<Value>) -> Self {
        Self { data: data.into(), attributes: SmallVec::new() }
    }

    /// Attach an attribute, replacing any previous value under that name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let attr = AttributeBuilder::new(value);
        for (k, v) in &mut self.attributes {
            if *k == name {
                *v = attr;
                return;
            }
        }
        self.attributes.push((name, attr));
    }

    /// Builder-style variant of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, a)| &a.value)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, a)| (k.as_str(), &a.value))
    }
}

/// Path reference within the same logical file, resolved lazily at read time.
#[derive(Clone, Debug, PartialEq)]
pub struct SoftLinkBuilder {
    pub path: String,
}

/// Strong alias of an object that must exist within the same file.
#[derive(Clone, Debug, PartialEq)]
pub struct HardLinkBuilder {
    pub path: String,
}

/// Reference to a path inside another file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalLinkBuilder {
    pub file_path: String,
    pub path: String,
}

/// The three link flavors a group can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkBuilder {
    Soft(SoftLinkBuilder),
    Hard(HardLinkBuilder),
    External(ExternalLinkBuilder),
}

/// A group node: named child groups, datasets, attributes and links.
#[derive(Clone, Debug, Default)]
pub struct GroupBuilder {
    groups: BTreeMap<String, GroupBuilder>,
    datasets: BTreeMap<String, DatasetBuilder>,
    attributes: AttributePairs,
    links: BTreeMap<String, LinkBuilder>,
}

impl PartialEq for GroupBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
            && self.datasets == other.datasets
            && self.links == other.links
            && attributes_eq(&self.attributes, &other.attributes)
    }
}

impl GroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any node of any kind exists under `name` at this level.
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
            || self.datasets.contains_key(name)
            || self.links.contains_key(name)
            || self.attributes.iter().any(|(k, _)| k == name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.datasets.is_empty()
            && self.attributes.is_empty()
            && self.links.is_empty()
    }

    pub fn add_group(&mut self, name: impl Into<String>, group: GroupBuilder) -> Result<&mut GroupBuilder> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }
        Ok(self.groups.entry(name).or_insert(group))
    }

    /// Get the child group under `name`, creating an empty one if absent.
    /// Fails if the name is taken by a non-group node.
    pub fn ensure_group(&mut self, name: &str) -> Result<&mut GroupBuilder> {
        if !self.groups.contains_key(name) && self.contains(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(self.groups.entry(name.to_string()).or_default())
    }

    pub fn add_dataset(&mut self, name: impl Into<String>, dataset: DatasetBuilder) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.datasets.insert(name, dataset);
        Ok(())
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.attributes.push((name, AttributeBuilder::new(value)));
        Ok(())
    }

    /// Attach an attribute, replacing any previous value under that name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let attr = AttributeBuilder::new(value);
        for (k, v) in &mut self.attributes {
            if *k == name {
                *v = attr;
                return;
            }
        }
        self.attributes.push((name, attr));
    }

    pub fn add_soft_link(&mut self, name: impl Into<String>, path: impl Into<String>) -> Result<()> {
        self.add_link(name.into(), LinkBuilder::Soft(SoftLinkBuilder { path: path.into() }))
    }

    pub fn add_hard_link(&mut self, name: impl Into<String>, path: impl Into<String>) -> Result<()> {
        self.add_link(name.into(), LinkBuilder::Hard(HardLinkBuilder { path: path.into() }))
    }

    pub fn add_external_link(
        &mut self,
        name: impl Into<String>,
        file_path: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<()> {
        self.add_link(
            name.into(),
            LinkBuilder::External(ExternalLinkBuilder { file_path: file_path.into(), path: path.into() }),
        )
    }

    fn add_link(&mut self, name: String, link: LinkBuilder) -> Result<()> {
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.links.insert(name, link);
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&GroupBuilder> {
        self.groups.get(name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut GroupBuilder> {
        self.groups.get_mut(name)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetBuilder> {
        self.datasets.get(name)
    }

    pub fn dataset_mut(&mut self, name: &str) -> Option<&mut DatasetBuilder> {
        self.datasets.get_mut(name)
    }

    pub fn link(&self, name: &str) -> Option<&LinkBuilder> {
        self.links.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, a)| &a.value)
    }

    /// Walk a '/'-separated path of group names.
    pub fn group_at_path(&self, path: &str) -> Option<&GroupBuilder> {
        let mut cur = self;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            cur = cur.groups.get(part)?;
        }
        Some(cur)
    }

    pub fn group_at_path_mut(&mut self, path: &str) -> Option<&mut GroupBuilder> {
        let mut cur = self;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            cur = cur.groups.get_mut(part)?;
        }
        Some(cur)
    }

    /// Resolve a '/'-separated path whose last segment names a dataset.
    pub fn dataset_at_path(&self, path: &str) -> Option<&DatasetBuilder> {
        let (dir, name) = match path.rfind('/') {
            Some(i) => (&path[..i], &path[i + 1..]),
            None => ("", path),
        };
        self.group_at_path(dir)?.dataset(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupBuilder)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&str, &DatasetBuilder)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, a)| (k.as_str(), &a.value))
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &LinkBuilder)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Recursively union another builder tree into this one.
    ///
    /// Disjoint children are adopted; identical redefinitions are idempotent;
    /// a redefinition that disagrees in value or node kind fails with
    /// [`Error::MergeConflict`].
    pub fn deep_merge(&mut self, other: GroupBuilder) -> Result<()> {
        for (name, group) in other.groups {
            if self.datasets.contains_key(&name)
                || self.links.contains_key(&name)
                || self.attributes.iter().any(|(k, _)| *k == name)
            {
                return Err(Error::MergeConflict(name));
            }
            self.groups.entry(name).or_default().deep_merge(group)?;
        }
        for (name, dataset) in other.datasets {
            if self.groups.contains_key(&name)
                || self.links.contains_key(&name)
                || self.attributes.iter().any(|(k, _)| *k == name)
            {
                return Err(Error::MergeConflict(name));
            }
            match self.datasets.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(dataset);
                }
                Entry::Occupied(mut slot) => {
                    let name = slot.key().clone();
                    let existing = slot.get_mut();
                    if existing.data != dataset.data {
                        return Err(Error::MergeConflict(name));
                    }
                    for (attr_name, attr) in dataset.attributes {
                        match existing.attributes.iter().position(|(k, _)| *k == attr_name) {
                            None => existing.attributes.push((attr_name, attr)),
                            Some(i) => {
                                if existing.attributes[i].1 != attr {
                                    return Err(Error::MergeConflict(attr_name));
                                }
                            }
                        }
                    }
                }
            }
        }
        for (name, attr) in other.attributes {
            if self.groups.contains_key(&name)
                || self.datasets.contains_key(&name)
                || self.links.contains_key(&name)
            {
                return Err(Error::MergeConflict(name));
            }
            match self.attributes.iter().position(|(k, _)| *k == name) {
                None => self.attributes.push((name, attr)),
                Some(i) => {
                    if self.attributes[i].1 != attr {
                        return Err(Error::MergeConflict(name));
                    }
                }
            }
        }
        for (name, link) in other.links {
            if self.contains(&name) {
                match self.links.get(&name) {
                    Some(existing) if *existing == link => continue,
                    _ => return Err(Error::MergeConflict(name)),
                }
            }
            self.links.insert(name, link);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_across_kinds() {
        let mut g = GroupBuilder::new();
        g.add_dataset("data", DatasetBuilder::new(vec![1.0, 2.0])).unwrap();

        let err = g.add_group("data", GroupBuilder::new()).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        let err = g.add_attribute("data", "x").unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        let err = g.add_soft_link("data", "/a/b").unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn test_deep_merge_disjoint_commutes() {
        let mut a = GroupBuilder::new();
        a.add_dataset("x", DatasetBuilder::new(1.0)).unwrap();
        a.add_attribute("unit", "Volts").unwrap();

        let mut b = GroupBuilder::new();
        b.add_dataset("y", DatasetBuilder::new(2.0)).unwrap();
        b.add_attribute("help", "sampled voltage").unwrap();
        b.add_group("sub", GroupBuilder::new()).unwrap();

        let mut ab = a.clone();
        ab.deep_merge(b.clone()).unwrap();
        let mut ba = b;
        ba.deep_merge(a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_deep_merge_conflict() {
        let mut a = GroupBuilder::new();
        a.add_attribute("unit", "Volts").unwrap();
        let mut b = GroupBuilder::new();
        b.add_attribute("unit", "Amps").unwrap();

        let err = a.deep_merge(b).unwrap_err();
        assert!(matches!(err, Error::MergeConflict(name) if name == "unit"));
    }

    #[test]
    fn test_deep_merge_identical_is_idempotent() {
        let mut a = GroupBuilder::new();
        a.add_dataset("x", DatasetBuilder::new(1.0).with_attribute("unit", "Seconds")).unwrap();
        let b = a.clone();
        a.deep_merge(b.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_group_at_path() {
        let mut root = GroupBuilder::new();
        let acq = root.add_group("acquisition", GroupBuilder::new()).unwrap();
        let ts = acq.add_group("timeseries", GroupBuilder::new()).unwrap();
        ts.add_dataset("data", DatasetBuilder::new(vec![0.0; 3])).unwrap();

        assert!(root.group_at_path("acquisition/timeseries").is_some());
        assert!(root.dataset_at_path("acquisition/timeseries/data").is_some());
        assert!(root.group_at_path("acquisition/images").is_none());
    }
}
