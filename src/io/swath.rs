use crate::types::{AodError, AodResult, Band, SwathMetadata};
use ndarray::Zip;

/// In-memory swath inputs for one retrieval run.
///
/// The satellite product reader lives outside this crate; it hands over the
/// per-pixel bands already co-registered on a common (line, sample) grid.
/// All bands share one shape, checked on construction.
#[derive(Debug, Clone)]
pub struct SwathProduct {
    /// TOA reflectance at the inversion band
    pub toa: Band,
    /// Surface-reflectance proxy at the inversion band
    pub csr: Band,
    /// Blue-band TOA reflectance, cloud screening input
    pub blue: Band,
    /// Infrared-band TOA reflectance, cloud screening input
    pub ir: Band,
    /// Solar zenith angle in degrees
    pub sza: Band,
    /// View zenith angle in degrees
    pub vza: Band,
    /// Relative azimuth angle in degrees, folded into [0, 180]
    pub raa: Band,
    /// Latitude, pass-through to the output container
    pub lat: Band,
    /// Longitude, pass-through to the output container
    pub lon: Band,

    pub metadata: Option<SwathMetadata>,
}

impl SwathProduct {
    /// Assemble a product from co-registered bands, validating shapes.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        toa: Band,
        csr: Band,
        blue: Band,
        ir: Band,
        sza: Band,
        vza: Band,
        raa: Band,
        lat: Band,
        lon: Band,
    ) -> AodResult<Self> {
        let shape = toa.dim();
        for (name, band) in [
            ("csr", &csr),
            ("blue", &blue),
            ("ir", &ir),
            ("sza", &sza),
            ("vza", &vza),
            ("raa", &raa),
            ("lat", &lat),
            ("lon", &lon),
        ] {
            if band.dim() != shape {
                return Err(AodError::Processing(format!(
                    "{} band is {:?}, expected {:?}",
                    name,
                    band.dim(),
                    shape
                )));
            }
        }

        Ok(Self {
            toa,
            csr,
            blue,
            ir,
            sza,
            vza,
            raa,
            lat,
            lon,
            metadata: None,
        })
    }

    pub fn with_metadata(mut self, metadata: SwathMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Grid shape as (lines, samples)
    pub fn dim(&self) -> (usize, usize) {
        self.toa.dim()
    }
}

/// Fold view/solar azimuth into a relative azimuth angle in [0, 180].
///
/// The absolute azimuth difference is reflected around 180 degrees:
/// `raa' = raa` if `raa <= 180`, else `360 - raa`.
pub fn fold_relative_azimuth(view_az: &Band, sol_az: &Band) -> Band {
    Zip::from(view_az).and(sol_az).map_collect(|&v, &s| {
        let raa = (v - s).abs();
        if raa <= 180.0 {
            raa
        } else {
            360.0 - raa
        }
    })
}

/// Derive the surface-reflectance proxy from a longer-wavelength companion
/// band.
///
/// The reference product assumes the surface reflectance at the inversion
/// band equals half the TOA reflectance at the companion band; sibling
/// products have used a quarter, so the factor is a parameter.
pub fn surface_proxy(companion_toa: &Band, factor: f32) -> Band {
    companion_toa.mapv(|v| v * factor)
}

/// Retrieved field handed to the external compressed-array writer: three
/// equal-shaped 2-D float arrays.
#[derive(Debug, Clone)]
pub struct AotField {
    pub aot: Band,
    pub lat: Band,
    pub lon: Band,
}

/// Boundary to the output container. Implementations (HDF5, NetCDF, Zarr)
/// live with the caller; they are expected to apply lossless compression.
pub trait AotWriter {
    fn write_field(&mut self, field: &AotField) -> AodResult<()>;
}
