//! Utility types and functions for the NWB crate.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Value`] - Scalar/array payloads for datasets and attributes
//! - [`Error`] / [`Result`] - Error handling

mod error;
mod value;

pub use error::*;
pub use value::*;
