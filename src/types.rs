use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued reflectance or geometry data
pub type BandValue = f32;

/// 2D per-pixel grid (line x sample)
pub type Band = Array2<BandValue>;

/// Observation geometry for a single pixel, all angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Solar zenith angle
    pub sza: f32,
    /// View zenith angle
    pub vza: f32,
    /// Relative azimuth angle, folded into [0, 180]
    pub raa: f32,
}

impl Geometry {
    pub fn new(sza: f32, vza: f32, raa: f32) -> Self {
        Self { sza, vza, raa }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(sza={:.2}, vza={:.2}, raa={:.2})",
            self.sza, self.vza, self.raa
        )
    }
}

/// Swath product metadata, carried for provenance and pass-through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwathMetadata {
    pub product_id: String,
    pub platform: String,
    pub instrument: String,
    pub acquisition_time: DateTime<Utc>,

    /// Center wavelength of the inversion band in nanometres
    pub inversion_wavelength_nm: f32,
    /// Center wavelength of the surface-proxy companion band in nanometres
    pub companion_wavelength_nm: f32,
}

/// Error types for AOD retrieval
#[derive(Debug, thiserror::Error)]
pub enum AodError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt LUT: {0}")]
    CorruptLut(String),

    #[error("Query outside LUT domain: {0}")]
    OutOfDomain(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for AOD retrieval operations
pub type AodResult<T> = Result<T, AodError>;
