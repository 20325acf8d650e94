//! Interval indexing of epochs against series timestamps.
//!
//! For every (epoch, referenced series) pair lacking a precomputed
//! membership record, a [`TimeFinder`] keyed by the series' canonical path
//! accumulates the epoch windows and locates each one inside the series'
//! timestamp array. Runs as a deferred pass once every series in the file
//! is known.

use crate::model::{ContainerId, DataSource, Registry, TimeSource};
use crate::util::{Error, Result};

/// Sample-range membership of one epoch window within one series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalRecord {
    /// First sample index with timestamp >= the epoch start.
    pub idx_start: i64,
    /// Number of consecutive samples from `idx_start` with timestamp <=
    /// the epoch stop. Zero denotes no overlap.
    pub count: i64,
}

/// Locates epoch windows within one series' timestamp array.
pub struct TimeFinder {
    timestamps: Vec<f64>,
    intervals: Vec<(ContainerId, f64, f64)>,
}

impl TimeFinder {
    /// Seed with an explicit timestamp array, monotonically non-decreasing.
    pub fn new(timestamps: Vec<f64>) -> Self {
        Self { timestamps, intervals: Vec::new() }
    }

    /// Seed with the regular grid `starting_time + i / rate`.
    pub fn from_rate(starting_time: f64, rate: f64, num_samples: usize) -> Self {
        let timestamps = (0..num_samples).map(|i| starting_time + i as f64 / rate).collect();
        Self::new(timestamps)
    }

    /// Accumulate one epoch's window.
    pub fn add_interval(&mut self, epoch: ContainerId, start: f64, stop: f64) {
        self.intervals.push((epoch, start, stop));
    }

    /// Locate a single window.
    pub fn locate(&self, start: f64, stop: f64) -> IntervalRecord {
        let first = self.timestamps.partition_point(|&t| t < start);
        let past = self.timestamps.partition_point(|&t| t <= stop);
        IntervalRecord { idx_start: first as i64, count: past.saturating_sub(first) as i64 }
    }

    /// Locate every accumulated window.
    pub fn find_all(&self) -> Vec<(ContainerId, IntervalRecord)> {
        self.intervals
            .iter()
            .map(|&(epoch, start, stop)| (epoch, self.locate(start, stop)))
            .collect()
    }
}

/// Build the finder for a series, resolving its timestamp source.
pub fn finder_for_series(reg: &Registry, series: ContainerId) -> Result<TimeFinder> {
    Ok(TimeFinder::new(resolve_timestamps(reg, series)?))
}

/// The series' timestamp array: explicit, derived from its rate grid, or
/// shared through a timestamp link chain. Link cycles are an error.
pub fn resolve_timestamps(reg: &Registry, series: ContainerId) -> Result<Vec<f64>> {
    let mut visited = vec![series];
    let mut cur = series;
    loop {
        let ts = reg.series(cur).ok_or_else(|| Error::MissingField {
            container: reg.name(cur).to_string(),
            field: "timestamps".to_string(),
        })?;
        match &ts.time {
            TimeSource::Timestamps(t) => return Ok(t.clone()),
            TimeSource::Rate { starting_time, rate } => {
                let n = resolve_num_samples(reg, cur)?;
                return Ok((0..n).map(|i| starting_time + i as f64 / rate).collect());
            }
            TimeSource::Link(target) => {
                if visited.contains(target) {
                    return Err(Error::UnresolvedLink(reg.name(cur).to_string()));
                }
                visited.push(*target);
                cur = *target;
            }
        }
    }
}

/// Sample count of a series, following data links. Link cycles are an error.
fn resolve_num_samples(reg: &Registry, series: ContainerId) -> Result<usize> {
    let mut visited = vec![series];
    let mut cur = series;
    loop {
        let ts = reg.series(cur).ok_or_else(|| Error::MissingField {
            container: reg.name(cur).to_string(),
            field: "data".to_string(),
        })?;
        match &ts.data {
            DataSource::Values(v) => return Ok(v.len()),
            DataSource::Link(target) => {
                if visited.contains(target) {
                    return Err(Error::UnresolvedLink(reg.name(cur).to_string()));
                }
                visited.push(*target);
                cur = *target;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeSeries;

    #[test]
    fn test_locate_within_regular_grid() {
        let finder = TimeFinder::from_rate(0.0, 1.0, 100);
        let rec = finder.locate(10.0, 20.0);
        assert_eq!(rec, IntervalRecord { idx_start: 10, count: 11 });
    }

    #[test]
    fn test_locate_smallest_start_index() {
        let finder = TimeFinder::new(vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        // First timestamp >= 0.6 is index 2; last <= 1.6 is index 3.
        let rec = finder.locate(0.6, 1.6);
        assert_eq!(rec, IntervalRecord { idx_start: 2, count: 2 });
    }

    #[test]
    fn test_locate_empty_overlap() {
        let finder = TimeFinder::new(vec![0.0, 1.0, 2.0]);
        let rec = finder.locate(5.0, 6.0);
        assert_eq!(rec.count, 0);

        // A window between two samples also has no members.
        let rec = finder.locate(1.2, 1.8);
        assert_eq!(rec, IntervalRecord { idx_start: 2, count: 0 });
    }

    #[test]
    fn test_resolve_timestamps_through_link() {
        let mut reg = Registry::new();
        let file = reg.create_file("a.nwb", "desc");
        let base = reg
            .add_raw_timeseries(
                file,
                TimeSeries::new("base", "src").with_data(vec![0.0; 4]).with_rate(0.0, 2.0),
            )
            .unwrap();
        let shared = TimeSeries::new("shared", "src")
            .with_data(vec![0.0; 4])
            .with_timestamps_link(base);
        let shared = reg.add_raw_timeseries(file, shared).unwrap();

        let t = resolve_timestamps(&reg, shared).unwrap();
        assert_eq!(t, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_timestamp_link_cycle_is_error() {
        let mut reg = Registry::new();
        let file = reg.create_file("a.nwb", "desc");
        let a = reg
            .add_raw_timeseries(file, TimeSeries::new("a", "src").with_data(vec![0.0; 2]))
            .unwrap();
        let b = reg
            .add_raw_timeseries(
                file,
                TimeSeries::new("b", "src").with_data(vec![0.0; 2]).with_timestamps_link(a),
            )
            .unwrap();
        // Rewire a's timestamps onto b to close the cycle.
        reg.series_mut_for_test(a).time = TimeSource::Link(b);

        let err = resolve_timestamps(&reg, b).unwrap_err();
        assert!(matches!(err, Error::UnresolvedLink(_)));
    }
}
