//! I/O modules for the LUT codec and the swath product boundary

pub mod lut;
pub mod swath;

pub use lut::{Lut, LutAxes, NodeCoefficients};
pub use swath::{fold_relative_azimuth, surface_proxy, AotField, AotWriter, SwathProduct};
