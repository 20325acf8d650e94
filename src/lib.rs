//! # NWB
//!
//! Rust implementation of the NWB neurophysiology data format (write path).
//!
//! An in-memory graph of recording objects - a file, its time series,
//! electrode groups, processing results and epochs - is rendered through a
//! declarative schema into a backend-independent builder tree, then
//! committed to a hierarchical-container backend with correct link
//! semantics (soft, hard, external) and data sharing.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (payload values, errors)
//! - [`model`] - Container registry and domain objects
//! - [`spec`] - Declarative per-type child specs and the type map
//! - [`builder`] - Builder tree intermediate representation
//! - [`render`] - Type-dispatched rendering, path resolution, interval indexing
//! - [`backend`] - Storage backend trait and the in-memory reference backend
//! - [`writer`] - Builder tree to backend commit with deferred links
//!
//! ## Example
//!
//! ```ignore
//! use nwb::prelude::*;
//!
//! let mut reg = Registry::new();
//! let file = reg.create_file("session.nwb", "sparse noise presentation");
//! let ts = TimeSeries::new("series1", "acquisition system")
//!     .with_data(vec![0.0; 100])
//!     .with_rate(0.0, 1.0)
//!     .with_unit("Volts");
//! reg.add_raw_timeseries(file, ts)?;
//!
//! let mut writer = Writer::new(MemBackend::new());
//! writer.write(&reg, file, "session.nwb")?;
//! ```

pub mod backend;
pub mod builder;
pub mod model;
pub mod render;
pub mod spec;
pub mod util;
pub mod writer;

// Re-export commonly used types
pub use util::{Error, Result, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{Backend, MemBackend, Mode};
    pub use crate::builder::{DatasetBuilder, GroupBuilder, LinkBuilder};
    pub use crate::model::{
        ContainerId, ElectrodeGroup, Epoch, Impedance, Interface, Module, NwbFile, Registry,
        TimeSeries, TypeTag,
    };
    pub use crate::render::{container_location, Renderer, TimeFinder};
    pub use crate::spec::{Spec, TypeMap};
    pub use crate::util::{Error, Result, Value};
    pub use crate::writer::Writer;
}
