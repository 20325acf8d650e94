//! Standard render procedures, one module per container family.

mod file;
mod module;
mod timeseries;

use crate::model::TypeTag;

use super::Renderer;

/// Register the standard procedure set.
pub(super) fn register(renderer: &mut Renderer) {
    renderer.register(TypeTag::NwbFile, file::nwb_file);
    renderer.register(TypeTag::TimeSeries, timeseries::time_series);
    renderer.register(TypeTag::ElectricalSeries, timeseries::electrical_series);
    renderer.register(TypeTag::SpatialSeries, timeseries::spatial_series);
    renderer.register(TypeTag::AbstractFeatureSeries, timeseries::abstract_feature_series);
    renderer.register(TypeTag::Clustering, module::clustering);
}
