use crate::types::{Band, Geometry};

/// Rayleigh phase function asymmetry constant
const PHASE_A: f32 = 0.958_725_6;

/// Surface Reflectance Estimation Method (SREM).
///
/// Analytic, LUT-free estimate of surface reflectance from TOA reflectance
/// and observation geometry (Bilal et al. 2019, doi:10.3390/rs11111344).
/// The atmosphere is characterized by Rayleigh scattering only; the aerosol
/// optical depth term is assumed zero in the backscattering ratio and the
/// total transmission.
///
/// All intermediate terms depend only on wavelength and geometry, so one
/// `Srem` can be reused across every TOA value observed at that geometry.
#[derive(Debug, Clone)]
pub struct Srem {
    /// Rayleigh optical depth
    pub rod: f32,
    /// Cosine of the scattering angle
    pub csa: f32,
    /// Rayleigh phase function
    pub rpf: f32,
    /// Rayleigh reflectance
    pub rr: f32,
    /// Atmospheric backscattering ratio
    pub abr: f32,
    /// Total atmospheric transmission
    pub tat: f32,
}

impl Srem {
    /// Precompute the Rayleigh terms for a wavelength in micrometres and a
    /// query geometry in degrees
    pub fn new(wavelength_um: f32, geometry: &Geometry) -> Self {
        let theta_s = geometry.sza.to_radians();
        let theta_v = geometry.vza.to_radians();
        let phi = geometry.raa.to_radians();
        let mu_s = theta_s.cos();
        let mu_v = theta_v.cos();

        // Hansen & Travis approximation of the Rayleigh optical depth
        let lam2 = wavelength_um * wavelength_um;
        let inv_lam4 = 1.0 / (lam2 * lam2);
        let rod = 0.008_569 * inv_lam4 * (1.0 + 0.0113 / lam2 + 0.0013 * inv_lam4);

        let csa = -mu_s * mu_v + theta_s.sin() * theta_v.sin() * phi.cos();
        let rpf = 3.0 * PHASE_A * (1.0 + csa * csa) / 4.0 + 1.0 - PHASE_A;
        let rr = rpf * (1.0 - (-(1.0 / mu_s + 1.0 / mu_v) * rod).exp()) / (4.0 * (mu_s + mu_v));

        let abr = 0.92 * rod * (-rod).exp();

        let tau_s = rod / mu_s;
        let tau_v = rod / mu_v;
        let tat = (-tau_s).exp()
            * ((0.52 * tau_s).exp() - 1.0)
            * (-tau_v).exp()
            * ((0.52 * tau_v).exp() - 1.0);

        Self {
            rod,
            csa,
            rpf,
            rr,
            abr,
            tat,
        }
    }

    /// Estimate surface reflectance from one TOA reflectance value
    pub fn surface_reflectance(&self, toa: f32) -> f32 {
        let path_removed = toa - self.rr;
        path_removed / (path_removed * self.abr + self.tat)
    }

    /// Estimate surface reflectance over a whole band observed at this
    /// geometry
    pub fn surface_reflectance_band(&self, toa: &Band) -> Band {
        toa.mapv(|v| self.surface_reflectance(v))
    }
}
