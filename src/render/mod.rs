//! Type-dispatched rendering of containers into builder trees.
//!
//! Every container type has an ordered set of render procedures; rendering
//! a container runs the procedures registered for every type in its
//! ancestor chain, base first, and deep-merges the partial trees. A generic
//! spec-driven pass then writes the fields the [`TypeMap`] declares,
//! deferring entries whose parent spec names a sibling node a procedure
//! assembles.
//!
//! - [`location`] - canonical storage paths
//! - [`intervals`] - epoch/series interval indexing
//! - `schema` - the standard render procedures

mod intervals;
mod location;
mod schema;

pub use intervals::*;
pub use location::*;

use std::collections::HashMap;

use tracing::trace;

use crate::builder::{DatasetBuilder, GroupBuilder};
use crate::model::{ContainerId, FieldValue, Registry, TypeTag};
use crate::spec::{FieldSpec, Spec, TypeMap};
use crate::util::{Error, Result};

/// One render procedure, registered against a specific type.
pub type RenderFn = fn(&RenderCtx<'_>, &Registry, ContainerId) -> Result<GroupBuilder>;

/// Context handed to render procedures, giving them recursive rendering.
pub struct RenderCtx<'a> {
    pub renderer: &'a Renderer,
}

const ALL_TAGS: [TypeTag; 10] = [
    TypeTag::NwbFile,
    TypeTag::TimeSeries,
    TypeTag::ElectricalSeries,
    TypeTag::SpatialSeries,
    TypeTag::AbstractFeatureSeries,
    TypeTag::Epoch,
    TypeTag::ElectrodeGroup,
    TypeTag::Module,
    TypeTag::Interface,
    TypeTag::Clustering,
];

/// Registry of render procedures plus the spec map they consult.
///
/// The base-to-derived procedure ordering per concrete type is composed
/// when procedures are registered, never during a render.
pub struct Renderer {
    type_map: TypeMap,
    registered: HashMap<TypeTag, Vec<RenderFn>>,
    composed: HashMap<TypeTag, Vec<RenderFn>>,
}

impl Renderer {
    /// An empty renderer over a custom spec map.
    pub fn new(type_map: TypeMap) -> Self {
        Self { type_map, registered: HashMap::new(), composed: HashMap::new() }
    }

    /// The standard renderer: the standard spec map plus the render
    /// procedures for every container type.
    pub fn standard() -> Self {
        let mut renderer = Self::new(TypeMap::standard().clone());
        schema::register(&mut renderer);
        renderer
    }

    /// Register a procedure for `tag`. Procedures registered for a base
    /// type run (earlier) for every derived type as well; registration
    /// order is preserved within one type.
    pub fn register(&mut self, tag: TypeTag, procedure: RenderFn) {
        self.registered.entry(tag).or_default().push(procedure);
        self.compose();
    }

    fn compose(&mut self) {
        self.composed.clear();
        for tag in ALL_TAGS {
            let mut chain: Vec<RenderFn> = Vec::new();
            for t in tag.lineage() {
                if let Some(procs) = self.registered.get(&t) {
                    chain.extend(procs.iter().copied());
                }
            }
            if !chain.is_empty() {
                self.composed.insert(tag, chain);
            }
        }
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    /// Produce the builder subtree for one container.
    pub fn render(&self, reg: &Registry, id: ContainerId) -> Result<GroupBuilder> {
        let tag = reg.tag(id);
        trace!(container = reg.name(id), %tag, "render");
        let mut builder = GroupBuilder::new();
        let ctx = RenderCtx { renderer: self };
        if let Some(procedures) = self.composed.get(&tag) {
            for procedure in procedures {
                let partial = procedure(&ctx, reg, id)?;
                builder.deep_merge(partial)?;
            }
        }
        self.apply_specs(reg, id, &mut builder)?;
        Ok(builder)
    }

    /// Generic spec-driven pass: write declared fields, deferring entries
    /// whose parent is a sibling node, then attach the deferred ones.
    fn apply_specs(&self, reg: &Registry, id: ContainerId, builder: &mut GroupBuilder) -> Result<()> {
        let tag = reg.tag(id);
        let specs = self.type_map.children_specs(tag);
        let mut deferred: Vec<(&FieldSpec, FieldValue)> = Vec::new();

        for fs in specs {
            let value = match reg.field(id, fs.field) {
                Some(v) => v,
                None if fs.required => {
                    return Err(Error::MissingField {
                        container: reg.name(id).to_string(),
                        field: fs.field.to_string(),
                    })
                }
                None => continue,
            };
            if fs.spec.parent().is_some() {
                deferred.push((fs, value));
                continue;
            }
            self.apply_entry(reg, builder, fs, value)?;
        }

        for (fs, value) in deferred {
            let target = fs.spec.parent().unwrap_or_default();
            if builder.link(target).is_some() {
                // The value belongs to the link target, which carries it
                // in its own file.
                continue;
            }
            if builder.dataset(target).is_some() {
                match (&fs.spec, value) {
                    (Spec::Attribute(a), FieldValue::Value(v)) => {
                        if let Some(ds) = builder.dataset_mut(target) {
                            ds.set_attribute(a.name, v);
                        }
                    }
                    _ => {
                        return Err(Error::SpecNotFound {
                            type_tag: tag.name(),
                            field: fs.field.to_string(),
                        })
                    }
                }
            } else if let Some(sub) = builder.group_mut(target) {
                self.apply_entry(reg, sub, fs, value)?;
            } else {
                // The declared parent never materialized: schema-authoring
                // error, fatal.
                return Err(Error::SpecNotFound { type_tag: tag.name(), field: target.to_string() });
            }
        }
        Ok(())
    }

    fn apply_entry(
        &self,
        reg: &Registry,
        builder: &mut GroupBuilder,
        fs: &FieldSpec,
        value: FieldValue,
    ) -> Result<()> {
        match (&fs.spec, value) {
            (Spec::Attribute(a), FieldValue::Value(v)) => builder.add_attribute(a.name, v),
            (Spec::Attribute(a), FieldValue::Child(child)) => {
                // A referenced container renders as its resolved path.
                let (_, path) = container_location(reg, child)?;
                builder.add_attribute(a.name, path)
            }
            (Spec::Dataset(d), FieldValue::Value(v)) => {
                builder.add_dataset(d.name, DatasetBuilder::new(v))
            }
            (Spec::Group(g), FieldValue::Child(child)) => self.attach_child(reg, builder, g.name, child),
            (Spec::Group(g), FieldValue::Children(children)) => {
                for child in children {
                    self.attach_child(reg, builder, g.name, child)?;
                }
                Ok(())
            }
            _ => Err(Error::SpecNotFound {
                type_tag: fs.declared_by.name(),
                field: fs.field.to_string(),
            }),
        }
    }

    fn attach_child(
        &self,
        reg: &Registry,
        builder: &mut GroupBuilder,
        group_name: Option<&'static str>,
        child: ContainerId,
    ) -> Result<()> {
        let sub = self.render(reg, child)?;
        let parent = match group_name {
            Some(name) => builder.ensure_group(name)?,
            None => builder,
        };
        parent.add_group(reg.name(child).to_string(), sub)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, TimeSeries};
    use crate::util::Value;

    fn sample_registry() -> (Registry, ContainerId) {
        let mut reg = Registry::new();
        let file = reg.create_file("test.nwb", "a test session");
        (reg, file)
    }

    #[test]
    fn test_render_is_idempotent() {
        let (mut reg, file) = sample_registry();
        reg.add_raw_timeseries(
            file,
            TimeSeries::new("series1", "unit test")
                .with_data(vec![0.0; 10])
                .with_rate(0.0, 1.0)
                .with_unit("Volts"),
        )
        .unwrap();
        reg.create_epoch(file, "ep1", 1.0, 2.0, vec!["tag".to_string()], None).unwrap();

        let renderer = Renderer::standard();
        let a = renderer.render(&reg, file).unwrap();
        let b = renderer.render(&reg, file).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_series_attributes_from_specs() {
        let (mut reg, file) = sample_registry();
        let ts = reg
            .add_raw_timeseries(
                file,
                TimeSeries::new("series1", "unit test")
                    .with_data(vec![1.0, 2.0])
                    .with_rate(0.0, 1.0)
                    .with_unit("Volts")
                    .electrical(vec![0, 1]),
            )
            .unwrap();

        let renderer = Renderer::standard();
        let built = renderer.render(&reg, ts).unwrap();
        assert_eq!(
            built.attribute("ancestry"),
            Some(&Value::StrList(vec!["TimeSeries".to_string(), "ElectricalSeries".to_string()]))
        );
        assert_eq!(built.attribute("neurodata_type"), Some(&Value::Str("TimeSeries".to_string())));
        // Deferred attributes landed on the data dataset.
        let data = built.dataset("data").unwrap();
        assert_eq!(data.attribute("unit"), Some(&Value::Str("Volts".to_string())));
        assert_eq!(data.attribute("conversion"), Some(&Value::Float(1.0)));
        // The variant procedure contributed alongside the base one.
        assert_eq!(built.dataset("electrode_idx").unwrap().data, Value::IntList(vec![0, 1]));
    }

    #[test]
    fn test_missing_required_field_is_fatal() {
        let (mut reg, file) = sample_registry();
        let module = reg.create_processing_module(file, "mod1", "desc").unwrap();
        let iface = reg.add_interface(module, Interface::new("BehavioralEvents", "src")).unwrap();

        let mut map = TypeMap::standard().clone();
        map.declare(TypeTag::Interface, "bogus", Spec::attribute("bogus"));
        let renderer = Renderer::new(map);
        let err = renderer.render(&reg, iface).unwrap_err();
        assert!(matches!(err, Error::MissingField { field, .. } if field == "bogus"));
    }

    #[test]
    fn test_deferred_target_never_created_is_fatal() {
        let (mut reg, file) = sample_registry();
        let ep = reg.create_epoch(file, "ep1", 0.0, 1.0, vec![], None).unwrap();

        let mut map = TypeMap::new();
        map.declare(TypeTag::Epoch, "start_time", Spec::attribute_on("t0", "window"));
        let renderer = Renderer::new(map);
        let err = renderer.render(&reg, ep).unwrap_err();
        assert!(matches!(err, Error::SpecNotFound { field, .. } if field == "window"));
    }
}
