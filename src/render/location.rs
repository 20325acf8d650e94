//! Canonical storage paths for containers.
//!
//! The resolver walks a container's parent chain and joins per-step
//! placement segments decided by a (parent type, child type) rule table.
//! It is consulted during rendering to fix attribute values that are paths
//! (link targets) and during writing to classify cross-references as
//! internal or external.

use crate::model::{ContainerId, Registry, TypeTag};
use crate::util::{Error, Result};

/// Placement segment of `child` directly under `parent`.
pub fn relative_location(reg: &Registry, parent: ContainerId, child: ContainerId) -> Result<String> {
    let parent_tag = reg.tag(parent);
    let child_tag = reg.tag(child);
    // Variants place like their root base type.
    let root = |t: TypeTag| t.lineage()[0];

    match (root(parent_tag), root(child_tag)) {
        (TypeTag::NwbFile, TypeTag::TimeSeries) => {
            let prefix = if reg.is_raw_data(parent, child) {
                "acquisition/timeseries"
            } else if reg.is_stimulus(parent, child) {
                "stimulus/presentation"
            } else if reg.is_stimulus_template(parent, child) {
                "stimulus/template"
            } else {
                return Err(Error::UnknownPlacement {
                    parent: parent_tag.name(),
                    child: child_tag.name(),
                });
            };
            Ok(format!("{prefix}/{}", reg.name(child)))
        }
        (TypeTag::NwbFile, TypeTag::Module) => Ok(format!("processing/{}", reg.name(child))),
        (TypeTag::NwbFile, TypeTag::Epoch) => Ok(format!("epochs/{}", reg.name(child))),
        (TypeTag::NwbFile, TypeTag::ElectrodeGroup) => {
            Ok(format!("general/extracellular_ephys/{}", reg.name(child)))
        }
        (TypeTag::Module, TypeTag::Interface) => Ok(reg.name(child).to_string()),
        (TypeTag::Interface, TypeTag::TimeSeries) => Ok(reg.name(child).to_string()),
        _ => Err(Error::UnknownPlacement { parent: parent_tag.name(), child: child_tag.name() }),
    }
}

/// Resolve a container to `(source, path)`: the root file's location and
/// the '/'-joined path of the container inside it.
pub fn container_location(reg: &Registry, id: ContainerId) -> Result<(String, String)> {
    let mut segments = Vec::new();
    let mut cur = id;
    while let Some(parent) = reg.parent(cur) {
        segments.push(relative_location(reg, parent, cur)?);
        cur = parent;
    }
    let file = reg
        .file(cur)
        .ok_or_else(|| Error::OrphanContainer(reg.name(id).to_string()))?;
    segments.reverse();
    Ok((file.filename.clone(), segments.join("/")))
}
