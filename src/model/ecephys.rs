//! Extracellular electrophysiology containers.

use crate::util::Value;

use super::FieldValue;

/// Electrode impedance, either a single value or a measured range.
#[derive(Clone, Copy, Debug)]
pub enum Impedance {
    Scalar(f64),
    Range(f64, f64),
}

impl Impedance {
    fn to_value(self) -> Value {
        match self {
            Impedance::Scalar(v) => Value::Float(v),
            Impedance::Range(lo, hi) => Value::FloatList(vec![lo, hi]),
        }
    }
}

/// A probe, shank or tetrode: a group of electrodes recorded together.
#[derive(Clone, Debug)]
pub struct ElectrodeGroup {
    pub name: String,
    pub coord: [f64; 3],
    pub description: String,
    pub device: String,
    pub location: String,
    pub impedance: Impedance,
}

impl ElectrodeGroup {
    pub fn new(
        name: impl Into<String>,
        coord: [f64; 3],
        description: impl Into<String>,
        device: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            coord,
            description: description.into(),
            device: device.into(),
            location: location.into(),
            impedance: Impedance::Scalar(-1.0),
        }
    }

    pub fn with_impedance(mut self, impedance: Impedance) -> Self {
        self.impedance = impedance;
        self
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "coord" => Value::from(self.coord),
            "description" => Value::Str(self.description.clone()),
            "device" => Value::Str(self.device.clone()),
            "location" => Value::Str(self.location.clone()),
            "impedance" => self.impedance.to_value(),
            _ => return None,
        };
        Some(FieldValue::Value(value))
    }
}
