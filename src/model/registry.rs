//! Container arena and type tags.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::util::Value;

use super::{ElectrodeGroup, Epoch, Interface, Module, NwbFile, TimeSeries};

/// Handle to a container in a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) u32);

/// Domain type of a container, with an explicit declared base per tag.
///
/// The tag hierarchy replaces runtime introspection: every renderer and
/// spec lookup walks [`lineage`](TypeTag::lineage) instead of a class chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    NwbFile,
    TimeSeries,
    ElectricalSeries,
    SpatialSeries,
    AbstractFeatureSeries,
    Epoch,
    ElectrodeGroup,
    Module,
    Interface,
    Clustering,
}

impl TypeTag {
    /// Declared base type, if any.
    pub fn base(self) -> Option<TypeTag> {
        match self {
            TypeTag::ElectricalSeries
            | TypeTag::SpatialSeries
            | TypeTag::AbstractFeatureSeries => Some(TypeTag::TimeSeries),
            TypeTag::Clustering => Some(TypeTag::Interface),
            _ => None,
        }
    }

    /// Ancestor chain ordered base-to-derived, ending with `self`.
    pub fn lineage(self) -> SmallVec<[TypeTag; 4]> {
        let mut chain: SmallVec<[TypeTag; 4]> = smallvec![self];
        let mut cur = self;
        while let Some(base) = cur.base() {
            chain.push(base);
            cur = base;
        }
        chain.reverse();
        chain
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::NwbFile => "NWBFile",
            TypeTag::TimeSeries => "TimeSeries",
            TypeTag::ElectricalSeries => "ElectricalSeries",
            TypeTag::SpatialSeries => "SpatialSeries",
            TypeTag::AbstractFeatureSeries => "AbstractFeatureSeries",
            TypeTag::Epoch => "Epoch",
            TypeTag::ElectrodeGroup => "ElectrodeGroup",
            TypeTag::Module => "Module",
            TypeTag::Interface => "Interface",
            TypeTag::Clustering => "Clustering",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A container field as seen by the renderer's generic spec pass.
#[derive(Clone, Debug)]
pub enum FieldValue {
    /// Plain scalar/array data.
    Value(Value),
    /// A single owned or referenced container.
    Child(ContainerId),
    /// A collection of owned containers, in insertion order.
    Children(Vec<ContainerId>),
}

pub(crate) enum Payload {
    File(NwbFile),
    Series(TimeSeries),
    Epoch(Epoch),
    Electrode(ElectrodeGroup),
    Module(Module),
    Interface(Interface),
}

pub(crate) struct Node {
    pub name: String,
    pub parent: Option<ContainerId>,
    pub payload: Payload,
}

/// Arena holding every container of one or more files.
///
/// Files that link to each other's data must share a registry, so that a
/// cross-file reference is an ordinary [`ContainerId`].
#[derive(Default)]
pub struct Registry {
    nodes: Vec<Node>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: String, parent: Option<ContainerId>, payload: Payload) -> ContainerId {
        let id = ContainerId(self.nodes.len() as u32);
        self.nodes.push(Node { name, parent, payload });
        id
    }

    pub(crate) fn node(&self, id: ContainerId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: ContainerId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Container name, unique within its parent's namespace.
    pub fn name(&self, id: ContainerId) -> &str {
        &self.node(id).name
    }

    /// Non-owning parent back-reference.
    pub fn parent(&self, id: ContainerId) -> Option<ContainerId> {
        self.node(id).parent
    }

    /// Domain type of the container, including variant refinement.
    pub fn tag(&self, id: ContainerId) -> TypeTag {
        match &self.node(id).payload {
            Payload::File(_) => TypeTag::NwbFile,
            Payload::Series(s) => s.tag(),
            Payload::Epoch(_) => TypeTag::Epoch,
            Payload::Electrode(_) => TypeTag::ElectrodeGroup,
            Payload::Module(_) => TypeTag::Module,
            Payload::Interface(i) => i.tag(),
        }
    }

    pub fn file(&self, id: ContainerId) -> Option<&NwbFile> {
        match &self.node(id).payload {
            Payload::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn file_mut(&mut self, id: ContainerId) -> Option<&mut NwbFile> {
        match &mut self.node_mut(id).payload {
            Payload::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn series(&self, id: ContainerId) -> Option<&TimeSeries> {
        match &self.node(id).payload {
            Payload::Series(s) => Some(s),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn series_mut_for_test(&mut self, id: ContainerId) -> &mut TimeSeries {
        match &mut self.node_mut(id).payload {
            Payload::Series(s) => s,
            _ => panic!("not a series"),
        }
    }

    pub fn epoch(&self, id: ContainerId) -> Option<&Epoch> {
        match &self.node(id).payload {
            Payload::Epoch(e) => Some(e),
            _ => None,
        }
    }

    pub fn electrode_group(&self, id: ContainerId) -> Option<&ElectrodeGroup> {
        match &self.node(id).payload {
            Payload::Electrode(g) => Some(g),
            _ => None,
        }
    }

    pub fn module(&self, id: ContainerId) -> Option<&Module> {
        match &self.node(id).payload {
            Payload::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn interface(&self, id: ContainerId) -> Option<&Interface> {
        match &self.node(id).payload {
            Payload::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// Look up a field for the renderer's generic spec pass.
    ///
    /// Payload-local fields delegate to the container; fields that need
    /// cross-node context (interface name lists) resolve here.
    pub fn field(&self, id: ContainerId, name: &str) -> Option<FieldValue> {
        match &self.node(id).payload {
            Payload::File(f) => f.field(name),
            Payload::Series(s) => s.field(name),
            Payload::Epoch(e) => e.field(name),
            Payload::Electrode(g) => g.field(name),
            Payload::Interface(i) => i.field(name),
            Payload::Module(m) => match name {
                "interface_names" => {
                    let names: Vec<String> =
                        m.interfaces().iter().map(|&i| self.name(i).to_string()).collect();
                    Some(FieldValue::Value(Value::StrList(names)))
                }
                _ => m.field(name),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineage_order() {
        let chain = TypeTag::ElectricalSeries.lineage();
        assert_eq!(chain.as_slice(), &[TypeTag::TimeSeries, TypeTag::ElectricalSeries]);

        let chain = TypeTag::Clustering.lineage();
        assert_eq!(chain.as_slice(), &[TypeTag::Interface, TypeTag::Clustering]);

        let chain = TypeTag::NwbFile.lineage();
        assert_eq!(chain.as_slice(), &[TypeTag::NwbFile]);
    }
}
