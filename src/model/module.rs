//! Processing modules and their interfaces.

use std::collections::BTreeMap;

use crate::util::{Error, Result, Value};

use super::{ContainerId, FieldValue, Payload, Registry, TypeTag};

/// A named set of processing results, persisted under `processing/`.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub description: String,
    interfaces: Vec<ContainerId>,
}

impl Module {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), interfaces: Vec::new() }
    }

    /// Owned interfaces in insertion order.
    pub fn interfaces(&self) -> &[ContainerId] {
        &self.interfaces
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "description" => Some(FieldValue::Value(Value::Str(self.description.clone()))),
            "neurodata_type" => Some(FieldValue::Value(Value::Str("Module".to_string()))),
            "interfaces" => Some(FieldValue::Children(self.interfaces.clone())),
            _ => None,
        }
    }
}

/// Variant payload for interfaces.
#[derive(Clone, Debug)]
pub enum InterfaceKind {
    Generic,
    /// Spike-sorting output: cluster number -> peak-over-RMS ratio, plus
    /// per-cluster spike counts and the flat spike time array.
    Clustering { peak_over_rms: BTreeMap<i64, f64>, num: Vec<i64>, times: Vec<f64> },
}

/// A processing result owned by a [`Module`].
#[derive(Clone, Debug)]
pub struct Interface {
    pub name: String,
    pub source: String,
    pub kind: InterfaceKind,
}

impl Interface {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), source: source.into(), kind: InterfaceKind::Generic }
    }

    pub fn clustering(
        source: impl Into<String>,
        peak_over_rms: BTreeMap<i64, f64>,
        num: Vec<i64>,
        times: Vec<f64>,
    ) -> Self {
        Self {
            name: "Clustering".to_string(),
            source: source.into(),
            kind: InterfaceKind::Clustering { peak_over_rms, num, times },
        }
    }

    pub fn tag(&self) -> TypeTag {
        match self.kind {
            InterfaceKind::Generic => TypeTag::Interface,
            InterfaceKind::Clustering { .. } => TypeTag::Clustering,
        }
    }

    pub fn help(&self) -> &'static str {
        match self.kind {
            InterfaceKind::Generic => "Interface for storing processed data",
            InterfaceKind::Clustering { .. } => "Clustered spike data, whether from automatic clustering tools or as a result of manual sorting",
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "source" => Value::Str(self.source.clone()),
            "help" => Value::Str(self.help().to_string()),
            "neurodata_type" => Value::Str("Interface".to_string()),
            _ => return None,
        };
        Some(FieldValue::Value(value))
    }
}

impl Registry {
    /// Create a processing module owned by `file`.
    pub fn create_processing_module(
        &mut self,
        file: ContainerId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ContainerId> {
        let name = name.into();
        let taken = match self.file(file) {
            Some(f) => f.modules().iter().any(|&m| self.name(m) == name),
            None => {
                return Err(Error::MissingField {
                    container: self.name(file).to_string(),
                    field: "modules".to_string(),
                })
            }
        };
        if taken {
            return Err(Error::DuplicateName(name));
        }
        let module = Module::new(name.clone(), description);
        let id = self.insert(name, Some(file), Payload::Module(module));
        self.file_mut(file).unwrap().modules_mut().push(id);
        Ok(id)
    }

    /// Attach an interface to a module, failing on a name collision.
    pub fn add_interface(&mut self, module: ContainerId, interface: Interface) -> Result<ContainerId> {
        let name = interface.name.clone();
        let taken = match self.module(module) {
            Some(m) => m.interfaces().iter().any(|&i| self.name(i) == name),
            None => {
                return Err(Error::MissingField {
                    container: self.name(module).to_string(),
                    field: "interfaces".to_string(),
                })
            }
        };
        if taken {
            return Err(Error::DuplicateName(name));
        }
        let id = self.insert(name, Some(module), Payload::Interface(interface));
        match &mut self.node_mut(module).payload {
            Payload::Module(m) => m.interfaces.push(id),
            _ => unreachable!(),
        }
        Ok(id)
    }
}
