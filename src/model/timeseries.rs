//! Time series containers and their data/time sources.

use crate::util::Value;

use super::{ContainerId, FieldValue, TypeTag};

/// Where a series gets its sample data from.
///
/// A link never copies: the referenced series' dataset is shared through a
/// soft or external link decided at render time.
#[derive(Clone, Debug)]
pub enum DataSource {
    Values(Value),
    Link(ContainerId),
}

/// Where a series gets its sample times from.
#[derive(Clone, Debug)]
pub enum TimeSource {
    /// Explicit per-sample timestamps, monotonically non-decreasing.
    Timestamps(Vec<f64>),
    /// Regular grid: sample `i` occurs at `starting_time + i / rate`.
    Rate { starting_time: f64, rate: f64 },
    /// Share another series' timestamps.
    Link(ContainerId),
}

/// Variant payload distinguishing the concrete series type.
#[derive(Clone, Debug)]
pub enum SeriesKind {
    Generic,
    Electrical { electrode_idx: Vec<i64> },
    Spatial { reference_frame: String },
    AbstractFeature { features: Vec<Vec<f64>>, feature_units: Vec<String> },
}

const DEFAULT_CONVERSION: f64 = 1.0;
const DEFAULT_RESOLUTION: f64 = 0.0;

/// A sampled measurement over the experiment timeline.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    pub name: String,
    pub source: String,
    pub data: DataSource,
    pub time: TimeSource,
    pub unit: String,
    pub conversion: f64,
    pub resolution: f64,
    pub description: String,
    pub comments: String,
    pub kind: SeriesKind,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            data: DataSource::Values(Value::FloatList(Vec::new())),
            time: TimeSource::Timestamps(Vec::new()),
            unit: String::new(),
            conversion: DEFAULT_CONVERSION,
            resolution: DEFAULT_RESOLUTION,
            description: "no description".to_string(),
            comments: "no comments".to_string(),
            kind: SeriesKind::Generic,
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = DataSource::Values(data.into());
        self
    }

    /// Share another series' data instead of owning samples.
    pub fn with_data_link(mut self, series: ContainerId) -> Self {
        self.data = DataSource::Link(series);
        self
    }

    pub fn with_timestamps(mut self, timestamps: Vec<f64>) -> Self {
        self.time = TimeSource::Timestamps(timestamps);
        self
    }

    pub fn with_rate(mut self, starting_time: f64, rate: f64) -> Self {
        self.time = TimeSource::Rate { starting_time, rate };
        self
    }

    /// Share another series' timestamps.
    pub fn with_timestamps_link(mut self, series: ContainerId) -> Self {
        self.time = TimeSource::Link(series);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_conversion(mut self, conversion: f64) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Refine into an ElectricalSeries with its electrode index list.
    pub fn electrical(mut self, electrode_idx: Vec<i64>) -> Self {
        self.kind = SeriesKind::Electrical { electrode_idx };
        self
    }

    /// Refine into a SpatialSeries with its reference frame.
    pub fn spatial(mut self, reference_frame: impl Into<String>) -> Self {
        self.kind = SeriesKind::Spatial { reference_frame: reference_frame.into() };
        self
    }

    /// Refine into an AbstractFeatureSeries with per-sample feature vectors.
    pub fn abstract_features(mut self, features: Vec<Vec<f64>>, feature_units: Vec<String>) -> Self {
        self.kind = SeriesKind::AbstractFeature { features, feature_units };
        self
    }

    pub fn tag(&self) -> TypeTag {
        match self.kind {
            SeriesKind::Generic => TypeTag::TimeSeries,
            SeriesKind::Electrical { .. } => TypeTag::ElectricalSeries,
            SeriesKind::Spatial { .. } => TypeTag::SpatialSeries,
            SeriesKind::AbstractFeature { .. } => TypeTag::AbstractFeatureSeries,
        }
    }

    pub fn help(&self) -> &'static str {
        match self.kind {
            SeriesKind::Generic => "General time series object",
            SeriesKind::Electrical { .. } => "Stores acquired voltage data from extracellular recordings",
            SeriesKind::Spatial { .. } => "Stores points in space over time",
            SeriesKind::AbstractFeature { .. } => "Features of an applied stimulus",
        }
    }

    /// Number of samples when the data is owned; `None` for links.
    pub fn num_samples(&self) -> Option<usize> {
        match &self.data {
            DataSource::Values(v) => Some(v.len()),
            DataSource::Link(_) => None,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "description" => Value::Str(self.description.clone()),
            "comments" => Value::Str(self.comments.clone()),
            "source" => Value::Str(self.source.clone()),
            "unit" => Value::Str(self.unit.clone()),
            "conversion" => Value::Float(self.conversion),
            "resolution" => Value::Float(self.resolution),
            "help" => Value::Str(self.help().to_string()),
            "neurodata_type" => Value::Str("TimeSeries".to_string()),
            "ancestry" => {
                Value::StrList(self.tag().lineage().iter().map(|t| t.name().to_string()).collect())
            }
            _ => return None,
        };
        Some(FieldValue::Value(value))
    }
}
