//! aodine: A Fast, Modular LUT-based Aerosol Optical Depth Retrieval Processor
//!
//! This library inverts per-pixel Aerosol Optical Depth at 550 nm from
//! satellite top-of-atmosphere reflectance using a precomputed
//! radiative-transfer lookup table: cloud screening, quad-axis coefficient
//! interpolation, and forward-model bracket inversion over a swath grid.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{AodError, AodResult, Band, BandValue, Geometry, SwathMetadata};

pub use io::{
    fold_relative_azimuth, surface_proxy, AotField, AotWriter, Lut, LutAxes, NodeCoefficients,
    SwathProduct,
};

pub use crate::core::{
    CloudScreenParams, DomainPolicy, EdgePolicy, LutInterpolator, RetrievalCounts,
    RetrievalOutput, RetrievalParams, RetrievalProcessor, Srem,
};
