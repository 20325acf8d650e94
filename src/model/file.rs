//! The root NWB file container and its factory surface.

use chrono::{DateTime, Utc};

use crate::util::{Error, Result, Value};

use super::{ContainerId, ElectrodeGroup, Epoch, FieldValue, Payload, Registry, TimeSeries};

/// Format version written into every file.
pub const NWB_VERSION: &str = "NWB-1.0.4";

/// The three disjoint series namespaces of a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesNamespace {
    RawData,
    Stimulus,
    StimulusTemplate,
}

/// Root container: owns every other container of one file.
pub struct NwbFile {
    pub filename: String,
    pub session_description: String,
    pub experimenter: Option<String>,
    pub experiment_description: Option<String>,
    pub session_id: Option<String>,
    pub lab: Option<String>,
    pub institution: Option<String>,
    start_time: DateTime<Utc>,
    file_id: String,
    raw_data: Vec<ContainerId>,
    stimulus: Vec<ContainerId>,
    stimulus_template: Vec<ContainerId>,
    epochs: Vec<ContainerId>,
    modules: Vec<ContainerId>,
    electrode_groups: Vec<ContainerId>,
}

impl NwbFile {
    fn new(filename: String, session_description: String) -> Self {
        let start_time = Utc::now();
        let file_id = format!("{} {}", filename, start_time.format("%Y-%m-%dT%H:%M:%SZ"));
        Self {
            filename,
            session_description,
            experimenter: None,
            experiment_description: None,
            session_id: None,
            lab: None,
            institution: None,
            start_time,
            file_id,
            raw_data: Vec::new(),
            stimulus: Vec::new(),
            stimulus_template: Vec::new(),
            epochs: Vec::new(),
            modules: Vec::new(),
            electrode_groups: Vec::new(),
        }
    }

    /// Session start, captured when the file container was created.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Derived identifier: filename plus ISO-8601 start time.
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn raw_data(&self) -> &[ContainerId] {
        &self.raw_data
    }

    pub fn stimulus(&self) -> &[ContainerId] {
        &self.stimulus
    }

    pub fn stimulus_template(&self) -> &[ContainerId] {
        &self.stimulus_template
    }

    pub fn epochs(&self) -> &[ContainerId] {
        &self.epochs
    }

    pub fn modules(&self) -> &[ContainerId] {
        &self.modules
    }

    /// Electrode groups in registration order; position is the stable index.
    pub fn electrode_groups(&self) -> &[ContainerId] {
        &self.electrode_groups
    }

    pub(crate) fn modules_mut(&mut self) -> &mut Vec<ContainerId> {
        &mut self.modules
    }

    fn namespace(&self, ns: SeriesNamespace) -> &Vec<ContainerId> {
        match ns {
            SeriesNamespace::RawData => &self.raw_data,
            SeriesNamespace::Stimulus => &self.stimulus,
            SeriesNamespace::StimulusTemplate => &self.stimulus_template,
        }
    }

    fn namespace_mut(&mut self, ns: SeriesNamespace) -> &mut Vec<ContainerId> {
        match ns {
            SeriesNamespace::RawData => &mut self.raw_data,
            SeriesNamespace::Stimulus => &mut self.stimulus,
            SeriesNamespace::StimulusTemplate => &mut self.stimulus_template,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "experimenter" => self.experimenter.clone()?,
            "experiment_description" => self.experiment_description.clone()?,
            "session_id" => self.session_id.clone()?,
            "lab" => self.lab.clone()?,
            "institution" => self.institution.clone()?,
            _ => return None,
        };
        Some(FieldValue::Value(Value::Str(value)))
    }
}

impl Registry {
    /// Create a new root file container.
    pub fn create_file(
        &mut self,
        filename: impl Into<String>,
        session_description: impl Into<String>,
    ) -> ContainerId {
        let filename = filename.into();
        let file = NwbFile::new(filename.clone(), session_description.into());
        self.insert(filename, None, Payload::File(file))
    }

    /// Attach an acquired-data series to the raw namespace.
    pub fn add_raw_timeseries(&mut self, file: ContainerId, ts: TimeSeries) -> Result<ContainerId> {
        self.add_series(file, ts, SeriesNamespace::RawData)
    }

    /// Attach a presented-stimulus series.
    pub fn add_stimulus(&mut self, file: ContainerId, ts: TimeSeries) -> Result<ContainerId> {
        self.add_series(file, ts, SeriesNamespace::Stimulus)
    }

    /// Attach a stimulus-template series.
    pub fn add_stimulus_template(&mut self, file: ContainerId, ts: TimeSeries) -> Result<ContainerId> {
        self.add_series(file, ts, SeriesNamespace::StimulusTemplate)
    }

    fn add_series(
        &mut self,
        file: ContainerId,
        ts: TimeSeries,
        ns: SeriesNamespace,
    ) -> Result<ContainerId> {
        let name = ts.name.clone();
        let taken = self
            .require_file(file)?
            .namespace(ns)
            .iter()
            .any(|&id| self.name(id) == name);
        if taken {
            return Err(Error::DuplicateName(name));
        }
        let id = self.insert(name, Some(file), Payload::Series(ts));
        self.file_mut(file).unwrap().namespace_mut(ns).push(id);
        Ok(id)
    }

    pub fn is_raw_data(&self, file: ContainerId, ts: ContainerId) -> bool {
        self.in_namespace(file, ts, SeriesNamespace::RawData)
    }

    pub fn is_stimulus(&self, file: ContainerId, ts: ContainerId) -> bool {
        self.in_namespace(file, ts, SeriesNamespace::Stimulus)
    }

    pub fn is_stimulus_template(&self, file: ContainerId, ts: ContainerId) -> bool {
        self.in_namespace(file, ts, SeriesNamespace::StimulusTemplate)
    }

    fn in_namespace(&self, file: ContainerId, ts: ContainerId, ns: SeriesNamespace) -> bool {
        self.file(file).is_some_and(|f| f.namespace(ns).contains(&ts))
    }

    /// Find a series by name, searching raw, stimulus, then template.
    pub fn get_timeseries(&self, file: ContainerId, name: &str) -> Option<ContainerId> {
        let f = self.file(file)?;
        f.raw_data
            .iter()
            .chain(&f.stimulus)
            .chain(&f.stimulus_template)
            .copied()
            .find(|&id| self.name(id) == name)
    }

    /// Create an epoch owned by `file`.
    pub fn create_epoch(
        &mut self,
        file: ContainerId,
        name: impl Into<String>,
        start_time: f64,
        stop_time: f64,
        tags: Vec<String>,
        description: Option<String>,
    ) -> Result<ContainerId> {
        let name = name.into();
        let taken = self.require_file(file)?.epochs.iter().any(|&id| self.name(id) == name);
        if taken {
            return Err(Error::DuplicateName(name));
        }
        let mut epoch = Epoch::new(name.clone(), start_time, stop_time)?.with_tags(tags);
        if let Some(description) = description {
            epoch = epoch.with_description(description);
        }
        let id = self.insert(name, Some(file), Payload::Epoch(epoch));
        self.file_mut(file).unwrap().epochs.push(id);
        Ok(id)
    }

    pub fn get_epoch(&self, file: ContainerId, name: &str) -> Option<ContainerId> {
        self.file(file)?.epochs.iter().copied().find(|&id| self.name(id) == name)
    }

    /// Add every named series to every named epoch (cross product).
    pub fn set_epoch_timeseries(
        &mut self,
        file: ContainerId,
        epochs: &[&str],
        timeseries: &[&str],
    ) -> Result<()> {
        let mut epoch_ids = Vec::with_capacity(epochs.len());
        for name in epochs {
            epoch_ids.push(
                self.get_epoch(file, name).ok_or_else(|| Error::MissingField {
                    container: self.name(file).to_string(),
                    field: format!("epochs/{name}"),
                })?,
            );
        }
        let mut series_ids = Vec::with_capacity(timeseries.len());
        for name in timeseries {
            series_ids.push(
                self.get_timeseries(file, name).ok_or_else(|| Error::MissingField {
                    container: self.name(file).to_string(),
                    field: format!("timeseries/{name}"),
                })?,
            );
        }
        for &ep in &epoch_ids {
            for &ts in &series_ids {
                self.add_epoch_timeseries(ep, ts)?;
            }
        }
        Ok(())
    }

    /// Create and register an electrode group; its index is its
    /// registration order.
    pub fn create_electrode_group(
        &mut self,
        file: ContainerId,
        group: ElectrodeGroup,
    ) -> Result<ContainerId> {
        let name = group.name.clone();
        let taken = self
            .require_file(file)?
            .electrode_groups
            .iter()
            .any(|&id| self.name(id) == name);
        if taken {
            return Err(Error::DuplicateName(name));
        }
        let id = self.insert(name, Some(file), Payload::Electrode(group));
        self.file_mut(file).unwrap().electrode_groups.push(id);
        Ok(id)
    }

    pub fn get_electrode_group(&self, file: ContainerId, name: &str) -> Option<ContainerId> {
        self.file(file)?.electrode_groups.iter().copied().find(|&id| self.name(id) == name)
    }

    /// Zero-based insertion-order index of a group, by name.
    pub fn get_electrode_group_idx(&self, file: ContainerId, name: &str) -> Option<usize> {
        self.file(file)?.electrode_groups.iter().position(|&id| self.name(id) == name)
    }

    /// Zero-based insertion-order index of a group, by id.
    pub fn electrode_group_index(&self, file: ContainerId, group: ContainerId) -> Option<usize> {
        self.file(file)?.electrode_groups.iter().position(|&id| id == group)
    }

    fn require_file(&self, file: ContainerId) -> Result<&NwbFile> {
        self.file(file).ok_or_else(|| Error::MissingField {
            container: self.name(file).to_string(),
            field: "file".to_string(),
        })
    }
}
