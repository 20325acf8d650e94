//! Named time intervals over the experiment timeline.

use crate::util::{Error, Result, Value};

use super::{ContainerId, FieldValue, Payload, Registry};

/// Membership of one referenced series within an epoch's window.
///
/// `idx_start`/`count` stay `None` until the interval indexer computes them
/// during rendering; precomputed values are honored as-is.
#[derive(Clone, Copy, Debug)]
pub struct EpochSeries {
    pub series: ContainerId,
    pub idx_start: Option<i64>,
    pub count: Option<i64>,
}

/// A named `[start, stop]` interval with tags and referenced series.
#[derive(Clone, Debug)]
pub struct Epoch {
    pub name: String,
    pub start_time: f64,
    pub stop_time: f64,
    pub description: Option<String>,
    pub tags: Vec<String>,
    timeseries: Vec<EpochSeries>,
}

impl Epoch {
    pub fn new(name: impl Into<String>, start_time: f64, stop_time: f64) -> Result<Self> {
        if stop_time < start_time {
            return Err(Error::InvalidInterval { start: start_time, stop: stop_time });
        }
        Ok(Self {
            name: name.into(),
            start_time,
            stop_time,
            description: None,
            tags: Vec::new(),
            timeseries: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Referenced series in insertion order.
    pub fn timeseries(&self) -> &[EpochSeries] {
        &self.timeseries
    }

    pub(crate) fn add_series(&mut self, series: ContainerId) {
        if self.timeseries.iter().all(|e| e.series != series) {
            self.timeseries.push(EpochSeries { series, idx_start: None, count: None });
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "start_time" => Value::Float(self.start_time),
            "stop_time" => Value::Float(self.stop_time),
            "tags" => Value::StrList(self.tags.clone()),
            "description" => Value::Str(self.description.clone()?),
            _ => return None,
        };
        Some(FieldValue::Value(value))
    }
}

impl Registry {
    /// Add one series to one epoch's membership set. Duplicates are ignored.
    pub fn add_epoch_timeseries(&mut self, epoch: ContainerId, series: ContainerId) -> Result<()> {
        if self.epoch(epoch).is_none() {
            return Err(Error::MissingField {
                container: self.name(epoch).to_string(),
                field: "timeseries".to_string(),
            });
        }
        if let Payload::Epoch(e) = &mut self.node_mut(epoch).payload {
            e.add_series(series);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_validation() {
        assert!(Epoch::new("ep", 1.0, 2.0).is_ok());
        let err = Epoch::new("ep", 2.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidInterval { .. }));
    }

    #[test]
    fn test_duplicate_series_ignored() {
        let mut ep = Epoch::new("ep", 0.0, 1.0).unwrap();
        ep.add_series(ContainerId(7));
        ep.add_series(ContainerId(7));
        assert_eq!(ep.timeseries().len(), 1);
    }
}
