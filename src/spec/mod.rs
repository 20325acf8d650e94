//! Declarative description of the expected sub-structure per container type.
//!
//! A [`Spec`] names one attribute, dataset or group expected under a
//! container; a [`FieldSpec`] ties it to the container field it reads and to
//! the type that declared it. The [`TypeMap`] resolves specs across a type's
//! ancestor chain and is the renderer's authority on what the generic pass
//! writes.
//!
//! Attribute and dataset specs may name a `parent`: a sibling dataset or
//! group, assembled by a render procedure, inside which the value belongs.
//! Such entries are deferred by the renderer until the target exists.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::TypeTag;
use crate::util::{Error, Result};

/// Scalar/string metadata attached to a group or dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub parent: Option<&'static str>,
}

/// Array-valued data, possibly nested inside a sibling group.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub parent: Option<&'static str>,
}

/// A sub-container (or collection of sub-containers) rendered recursively.
///
/// With `name: None`, each child nests directly under the rendered group,
/// named by the child container itself.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSpec {
    pub name: Option<&'static str>,
}

/// One expected child under a container type.
#[derive(Clone, Debug, PartialEq)]
pub enum Spec {
    Attribute(AttributeSpec),
    Dataset(DatasetSpec),
    Group(GroupSpec),
}

impl Spec {
    pub fn attribute(name: &'static str) -> Self {
        Spec::Attribute(AttributeSpec { name, parent: None })
    }

    /// An attribute that lives on the sibling node `parent`.
    pub fn attribute_on(name: &'static str, parent: &'static str) -> Self {
        Spec::Attribute(AttributeSpec { name, parent: Some(parent) })
    }

    pub fn dataset(name: &'static str) -> Self {
        Spec::Dataset(DatasetSpec { name, parent: None })
    }

    /// A dataset that lives inside the sibling group `parent`.
    pub fn dataset_on(name: &'static str, parent: &'static str) -> Self {
        Spec::Dataset(DatasetSpec { name, parent: Some(parent) })
    }

    pub fn group(name: Option<&'static str>) -> Self {
        Spec::Group(GroupSpec { name })
    }

    /// The sibling node this entry defers to, if any.
    pub fn parent(&self) -> Option<&'static str> {
        match self {
            Spec::Attribute(a) => a.parent,
            Spec::Dataset(d) => d.parent,
            Spec::Group(_) => None,
        }
    }

    /// Storage name of the entry, where fixed.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Spec::Attribute(a) => Some(a.name),
            Spec::Dataset(d) => Some(d.name),
            Spec::Group(g) => g.name,
        }
    }
}

/// A spec bound to the container field that feeds it.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    /// Field name looked up on the container.
    pub field: &'static str,
    pub spec: Spec,
    /// The type in the ancestor chain that declared this entry.
    pub declared_by: TypeTag,
    /// Required fields absent on the container are a render error;
    /// optional ones are skipped.
    pub required: bool,
}

/// Registry of declared children per container type, resolved across each
/// type's ancestor chain.
#[derive(Clone, Default)]
pub struct TypeMap {
    specs: HashMap<TypeTag, Vec<FieldSpec>>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field on `tag`.
    pub fn declare(&mut self, tag: TypeTag, field: &'static str, spec: Spec) {
        self.specs
            .entry(tag)
            .or_default()
            .push(FieldSpec { field, spec, declared_by: tag, required: true });
    }

    /// Declare an optional field on `tag`.
    pub fn declare_optional(&mut self, tag: TypeTag, field: &'static str, spec: Spec) {
        self.specs
            .entry(tag)
            .or_default()
            .push(FieldSpec { field, spec, declared_by: tag, required: false });
    }

    /// Resolve one field's spec, walking the ancestor chain from most
    /// specific to least and returning the first declared match.
    pub fn get_spec(&self, tag: TypeTag, field: &str) -> Result<&FieldSpec> {
        for t in tag.lineage().iter().rev() {
            if let Some(found) = self
                .specs
                .get(t)
                .and_then(|entries| entries.iter().find(|fs| fs.field == field))
            {
                return Ok(found);
            }
        }
        Err(Error::SpecNotFound { type_tag: tag.name(), field: field.to_string() })
    }

    /// All declared children across the chain, base-to-derived order, with
    /// re-declared fields resolved derived-wins (in the base's position).
    pub fn children_specs(&self, tag: TypeTag) -> Vec<&FieldSpec> {
        let mut out: Vec<&FieldSpec> = Vec::new();
        for t in tag.lineage() {
            if let Some(entries) = self.specs.get(&t) {
                for fs in entries {
                    match out.iter().position(|e| e.field == fs.field) {
                        Some(i) => out[i] = fs,
                        None => out.push(fs),
                    }
                }
            }
        }
        out
    }

    /// The standard map for the declared format version, built once per
    /// process and never mutated during a write.
    pub fn standard() -> &'static TypeMap {
        static STANDARD: OnceLock<TypeMap> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut map = TypeMap::new();

            let ts = TypeTag::TimeSeries;
            map.declare(ts, "description", Spec::attribute("description"));
            map.declare(ts, "comments", Spec::attribute("comments"));
            map.declare(ts, "source", Spec::attribute("source"));
            map.declare(ts, "ancestry", Spec::attribute("ancestry"));
            map.declare(ts, "neurodata_type", Spec::attribute("neurodata_type"));
            map.declare(ts, "help", Spec::attribute("help"));
            map.declare(ts, "unit", Spec::attribute_on("unit", "data"));
            map.declare(ts, "conversion", Spec::attribute_on("conversion", "data"));
            map.declare(ts, "resolution", Spec::attribute_on("resolution", "data"));

            let ep = TypeTag::Epoch;
            map.declare(ep, "start_time", Spec::dataset("start_time"));
            map.declare(ep, "stop_time", Spec::dataset("stop_time"));
            map.declare(ep, "tags", Spec::dataset("tags"));
            map.declare_optional(ep, "description", Spec::dataset("description"));

            let eg = TypeTag::ElectrodeGroup;
            map.declare(eg, "coord", Spec::dataset("coord"));
            map.declare(eg, "description", Spec::dataset("description"));
            map.declare(eg, "device", Spec::dataset("device"));
            map.declare(eg, "location", Spec::dataset("location"));
            map.declare(eg, "impedance", Spec::dataset("impedance"));

            let md = TypeTag::Module;
            map.declare(md, "description", Spec::attribute("description"));
            map.declare(md, "neurodata_type", Spec::attribute("neurodata_type"));
            map.declare(md, "interface_names", Spec::attribute("interfaces"));
            map.declare(md, "interfaces", Spec::group(None));

            let iface = TypeTag::Interface;
            map.declare(iface, "source", Spec::attribute("source"));
            map.declare(iface, "help", Spec::attribute("help"));
            map.declare(iface, "neurodata_type", Spec::attribute("neurodata_type"));

            let file = TypeTag::NwbFile;
            map.declare_optional(file, "experimenter", Spec::dataset_on("experimenter", "general"));
            map.declare_optional(
                file,
                "experiment_description",
                Spec::dataset_on("experiment_description", "general"),
            );
            map.declare_optional(file, "session_id", Spec::dataset_on("session_id", "general"));
            map.declare_optional(file, "lab", Spec::dataset_on("lab", "general"));
            map.declare_optional(file, "institution", Spec::dataset_on("institution", "general"));

            map
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_spec_walks_ancestor_chain() {
        let map = TypeMap::standard();
        // ElectricalSeries declares nothing itself; the base provides it.
        let fs = map.get_spec(TypeTag::ElectricalSeries, "description").unwrap();
        assert_eq!(fs.declared_by, TypeTag::TimeSeries);
        // Clustering inherits Interface attributes.
        let fs = map.get_spec(TypeTag::Clustering, "help").unwrap();
        assert_eq!(fs.declared_by, TypeTag::Interface);
    }

    #[test]
    fn test_get_spec_not_found() {
        let map = TypeMap::standard();
        let err = map.get_spec(TypeTag::Epoch, "bogus").unwrap_err();
        assert!(matches!(err, Error::SpecNotFound { .. }));
    }

    #[test]
    fn test_children_specs_derived_wins() {
        let mut map = TypeMap::new();
        map.declare(TypeTag::TimeSeries, "description", Spec::attribute("description"));
        map.declare(TypeTag::TimeSeries, "unit", Spec::attribute("unit"));
        // A subtype re-declares the field as a dataset.
        map.declare(TypeTag::SpatialSeries, "description", Spec::dataset("description"));

        let specs = map.children_specs(TypeTag::SpatialSeries);
        assert_eq!(specs.len(), 2);
        let desc = specs.iter().find(|fs| fs.field == "description").unwrap();
        assert_eq!(desc.declared_by, TypeTag::SpatialSeries);
        assert!(matches!(desc.spec, Spec::Dataset(_)));
    }

    #[test]
    fn test_deferred_parent_declared() {
        let map = TypeMap::standard();
        let fs = map.get_spec(TypeTag::TimeSeries, "unit").unwrap();
        assert_eq!(fs.spec.parent(), Some("data"));
    }
}
