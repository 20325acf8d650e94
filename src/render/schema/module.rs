//! Render procedures for processing interfaces.

use crate::builder::{DatasetBuilder, GroupBuilder};
use crate::model::{ContainerId, InterfaceKind, Registry};
use crate::render::RenderCtx;
use crate::util::{Error, Result};

/// Clustering datasets: cluster numbers in sorted order with their
/// peak-over-RMS ratios aligned, plus spike counts and times.
pub(super) fn clustering(
    _ctx: &RenderCtx<'_>,
    reg: &Registry,
    id: ContainerId,
) -> Result<GroupBuilder> {
    let iface = reg.interface(id).ok_or_else(|| Error::MissingField {
        container: reg.name(id).to_string(),
        field: "peak_over_rms".to_string(),
    })?;
    let InterfaceKind::Clustering { peak_over_rms, num, times } = &iface.kind else {
        return Err(Error::MissingField {
            container: reg.name(id).to_string(),
            field: "peak_over_rms".to_string(),
        });
    };

    let cluster_nums: Vec<i64> = peak_over_rms.keys().copied().collect();
    let ratios: Vec<f64> = peak_over_rms.values().copied().collect();

    let mut builder = GroupBuilder::new();
    builder.add_dataset("cluster_nums", DatasetBuilder::new(cluster_nums))?;
    builder.add_dataset("peak_over_rms", DatasetBuilder::new(ratios))?;
    builder.add_dataset("num", DatasetBuilder::new(num.clone()))?;
    builder.add_dataset("times", DatasetBuilder::new(times.clone()))?;
    Ok(builder)
}
