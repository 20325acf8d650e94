//! Render procedure for the root file container.

use std::collections::BTreeMap;

use crate::builder::{DatasetBuilder, GroupBuilder};
use crate::model::{ContainerId, Registry, NWB_VERSION};
use crate::render::{container_location, finder_for_series, RenderCtx, TimeFinder};
use crate::util::{Error, Result, Value};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn subgroup<'a>(builder: &'a mut GroupBuilder, path: &str) -> Result<&'a mut GroupBuilder> {
    builder
        .group_at_path_mut(path)
        .ok_or_else(|| Error::SpecNotFound { type_tag: "NWBFile", field: path.to_string() })
}

/// The whole-file procedure: fixed top-level structure, file-level
/// datasets, then every owned container rendered into its place, with the
/// epoch interval-index pass last.
pub(super) fn nwb_file(ctx: &RenderCtx<'_>, reg: &Registry, id: ContainerId) -> Result<GroupBuilder> {
    let file = reg.file(id).ok_or_else(|| Error::MissingField {
        container: reg.name(id).to_string(),
        field: "session_description".to_string(),
    })?;

    let mut builder = GroupBuilder::new();

    let mut general = GroupBuilder::new();
    for name in [
        "devices",
        "extracellular_ephys",
        "intracellular_ephys",
        "optogenetics",
        "optophysiology",
        "specifications",
        "subject",
    ] {
        general.add_group(name, GroupBuilder::new())?;
    }
    builder.add_group("general", general)?;

    let mut stimulus = GroupBuilder::new();
    stimulus.add_group("template", GroupBuilder::new())?;
    stimulus.add_group("presentation", GroupBuilder::new())?;
    builder.add_group("stimulus", stimulus)?;

    let mut acquisition = GroupBuilder::new();
    acquisition.add_group("timeseries", GroupBuilder::new())?;
    acquisition.add_group("images", GroupBuilder::new())?;
    builder.add_group("acquisition", acquisition)?;

    builder.add_group("epochs", GroupBuilder::new())?;
    builder.add_group("processing", GroupBuilder::new())?;
    builder.add_group("analysis", GroupBuilder::new())?;

    let created = file.start_time().format(TIME_FORMAT).to_string();
    builder.add_dataset("nwb_version", DatasetBuilder::new(NWB_VERSION))?;
    builder.add_dataset("identifier", DatasetBuilder::new(file.file_id()))?;
    builder.add_dataset("session_description", DatasetBuilder::new(file.session_description.as_str()))?;
    builder.add_dataset("file_create_date", DatasetBuilder::new(Value::StrList(vec![created.clone()])))?;
    builder.add_dataset("session_start_time", DatasetBuilder::new(created))?;

    for (series, prefix) in [
        (file.raw_data(), "acquisition/timeseries"),
        (file.stimulus(), "stimulus/presentation"),
        (file.stimulus_template(), "stimulus/template"),
    ] {
        for &ts in series {
            let rendered = ctx.renderer.render(reg, ts)?;
            subgroup(&mut builder, prefix)?.add_group(reg.name(ts).to_string(), rendered)?;
        }
    }

    for &module in file.modules() {
        let rendered = ctx.renderer.render(reg, module)?;
        subgroup(&mut builder, "processing")?.add_group(reg.name(module).to_string(), rendered)?;
    }

    for &group in file.electrode_groups() {
        let rendered = ctx.renderer.render(reg, group)?;
        subgroup(&mut builder, "general/extracellular_ephys")?
            .add_group(reg.name(group).to_string(), rendered)?;
    }

    for &epoch in file.epochs() {
        let rendered = ctx.renderer.render(reg, epoch)?;
        subgroup(&mut builder, "epochs")?.add_group(reg.name(epoch).to_string(), rendered)?;
    }

    index_epochs(reg, file.epochs(), &mut builder)?;

    Ok(builder)
}

/// Deferred interval-index pass: runs once every series in the file is
/// known, fills in each epoch's membership records and attaches them under
/// `epochs/<epoch>/<series>`.
fn index_epochs(reg: &Registry, epochs: &[ContainerId], builder: &mut GroupBuilder) -> Result<()> {
    // One finder per referenced series, keyed by its canonical path.
    let mut finders: BTreeMap<String, (ContainerId, TimeFinder)> = BTreeMap::new();

    for &epoch_id in epochs {
        let epoch = reg.epoch(epoch_id).ok_or_else(|| Error::MissingField {
            container: reg.name(epoch_id).to_string(),
            field: "timeseries".to_string(),
        })?;
        for entry in epoch.timeseries() {
            if let (Some(idx_start), Some(count)) = (entry.idx_start, entry.count) {
                attach_membership(reg, builder, epoch_id, entry.series, idx_start, count)?;
                continue;
            }
            let (_, path) = container_location(reg, entry.series)?;
            if !finders.contains_key(&path) {
                let finder = finder_for_series(reg, entry.series)?;
                finders.insert(path.clone(), (entry.series, finder));
            }
            if let Some((_, finder)) = finders.get_mut(&path) {
                finder.add_interval(epoch_id, epoch.start_time, epoch.stop_time);
            }
        }
    }

    for (_, (series, finder)) in finders {
        for (epoch_id, record) in finder.find_all() {
            attach_membership(reg, builder, epoch_id, series, record.idx_start, record.count)?;
        }
    }
    Ok(())
}

fn attach_membership(
    reg: &Registry,
    builder: &mut GroupBuilder,
    epoch: ContainerId,
    series: ContainerId,
    idx_start: i64,
    count: i64,
) -> Result<()> {
    let (epoch_file, epoch_path) = container_location(reg, epoch)?;
    let (series_file, series_path) = container_location(reg, series)?;

    let mut membership = GroupBuilder::new();
    membership.add_dataset("idx_start", DatasetBuilder::new(idx_start))?;
    membership.add_dataset("count", DatasetBuilder::new(count))?;
    if epoch_file == series_file {
        membership.add_soft_link("timeseries", series_path)?;
    } else {
        membership.add_external_link("timeseries", series_file, series_path)?;
    }

    subgroup(builder, &epoch_path)?.add_group(reg.name(series).to_string(), membership)?;
    Ok(())
}
