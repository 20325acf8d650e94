//! Render procedures for time series and their variants.

use crate::builder::{DatasetBuilder, GroupBuilder};
use crate::model::{ContainerId, DataSource, Registry, SeriesKind, TimeSeries, TimeSource};
use crate::render::{container_location, RenderCtx};
use crate::util::{Error, Result, Value};

fn require_series<'a>(reg: &'a Registry, id: ContainerId) -> Result<&'a TimeSeries> {
    reg.series(id).ok_or_else(|| Error::MissingField {
        container: reg.name(id).to_string(),
        field: "data".to_string(),
    })
}

/// Emit a link to a dataset of another series: soft within the same file,
/// external across files.
fn link_dataset(
    reg: &Registry,
    builder: &mut GroupBuilder,
    own: ContainerId,
    target: ContainerId,
    name: &str,
) -> Result<()> {
    let (own_file, _) = container_location(reg, own)?;
    let (ref_file, ref_path) = container_location(reg, target)?;
    let dataset_path = format!("{ref_path}/{name}");
    if own_file == ref_file {
        builder.add_soft_link(name, dataset_path)
    } else {
        builder.add_external_link(name, ref_file, dataset_path)
    }
}

/// Base procedure: data and time sources under the link-vs-copy rule.
///
/// The descriptive attributes (including unit/conversion/resolution on the
/// data dataset) come from the spec pass, not from here.
pub(super) fn time_series(
    _ctx: &RenderCtx<'_>,
    reg: &Registry,
    id: ContainerId,
) -> Result<GroupBuilder> {
    let ts = require_series(reg, id)?;
    let mut builder = GroupBuilder::new();

    match &ts.data {
        DataSource::Values(v) => {
            builder.add_dataset("data", DatasetBuilder::new(v.clone()))?;
        }
        DataSource::Link(target) => link_dataset(reg, &mut builder, id, *target, "data")?,
    }

    match &ts.time {
        TimeSource::Rate { starting_time, rate } => {
            builder.add_dataset(
                "starting_time",
                DatasetBuilder::new(*starting_time)
                    .with_attribute("rate", *rate)
                    .with_attribute("unit", "Seconds"),
            )?;
        }
        TimeSource::Timestamps(t) => {
            builder.add_dataset(
                "timestamps",
                DatasetBuilder::new(t.clone())
                    .with_attribute("interval", 1i64)
                    .with_attribute("unit", "Seconds"),
            )?;
        }
        TimeSource::Link(target) => link_dataset(reg, &mut builder, id, *target, "timestamps")?,
    }

    Ok(builder)
}

pub(super) fn electrical_series(
    _ctx: &RenderCtx<'_>,
    reg: &Registry,
    id: ContainerId,
) -> Result<GroupBuilder> {
    let ts = require_series(reg, id)?;
    let SeriesKind::Electrical { electrode_idx } = &ts.kind else {
        return Err(Error::MissingField {
            container: reg.name(id).to_string(),
            field: "electrode_idx".to_string(),
        });
    };
    let mut builder = GroupBuilder::new();
    builder.add_dataset("electrode_idx", DatasetBuilder::new(electrode_idx.clone()))?;
    Ok(builder)
}

pub(super) fn spatial_series(
    _ctx: &RenderCtx<'_>,
    reg: &Registry,
    id: ContainerId,
) -> Result<GroupBuilder> {
    let ts = require_series(reg, id)?;
    let SeriesKind::Spatial { reference_frame } = &ts.kind else {
        return Err(Error::MissingField {
            container: reg.name(id).to_string(),
            field: "reference_frame".to_string(),
        });
    };
    let mut builder = GroupBuilder::new();
    builder.add_dataset("reference_frame", DatasetBuilder::new(reference_frame.as_str()))?;
    Ok(builder)
}

pub(super) fn abstract_feature_series(
    _ctx: &RenderCtx<'_>,
    reg: &Registry,
    id: ContainerId,
) -> Result<GroupBuilder> {
    let ts = require_series(reg, id)?;
    let SeriesKind::AbstractFeature { features, feature_units } = &ts.kind else {
        return Err(Error::MissingField {
            container: reg.name(id).to_string(),
            field: "features".to_string(),
        });
    };
    let mut builder = GroupBuilder::new();
    builder.add_dataset("features", DatasetBuilder::new(features.clone()))?;
    builder.add_dataset("feature_units", DatasetBuilder::new(Value::StrList(feature_units.clone())))?;
    Ok(builder)
}
