use crate::core::interpolate::lerp;
use crate::io::lut::NodeCoefficients;

/// Evaluate the forward radiative-transfer TOA equation at one AOT node.
///
/// `TOA = (p + (tdn * tup * csr) / (1 - s * csr)) * t` with `csr` the
/// surface-reflectance proxy. A vanishing `1 - s * csr` denominator is left
/// to produce a non-finite value; such a value can never satisfy a bracket
/// comparison downstream, so a singular pixel resolves to the NaN result
/// instead of an arithmetic fault.
pub fn forward_toa(c: &NodeCoefficients, csr: f32) -> f32 {
    (c.p + (c.tdn * c.tup * csr) / (1.0 - c.s * csr)) * c.t
}

/// Modeled TOA at every AOT node, ordered with the ascending AOT axis
pub fn model_curve(profile: &[NodeCoefficients], csr: f32) -> Vec<f32> {
    profile.iter().map(|c| forward_toa(c, csr)).collect()
}

/// Whether a model curve is strictly monotonic (either direction).
///
/// Monotonicity over AOT is a physical precondition of the bracket search,
/// not something the solver enforces; synthetic tables should be checked
/// with this when tests rely on unique brackets.
pub fn is_strictly_monotonic(curve: &[f32]) -> bool {
    curve.windows(2).all(|w| w[0] < w[1]) || curve.windows(2).all(|w| w[0] > w[1])
}

/// Invert an observed TOA reflectance to an AOT value.
///
/// The forward model is evaluated at every AOT node using the interpolated
/// coefficient profile and the pixel's fixed `csr`. An observation exactly
/// equal to a node's modeled TOA returns that node's AOT directly. Otherwise
/// the adjacent node pair straddling the observation is located, in either
/// direction since the model curve is not assumed monotonic a priori, and
/// the AOT is linearly interpolated with modeled TOA as the abscissa. The
/// first straddling pair wins. No bracket means the observation lies outside
/// the modeled range and NaN is returned.
pub fn invert_aot(profile: &[NodeCoefficients], lut_aot: &[f32], csr: f32, toa_obs: f32) -> f32 {
    debug_assert_eq!(profile.len(), lut_aot.len());

    let stoa = model_curve(profile, csr);
    for (i, &modeled) in stoa.iter().enumerate() {
        if modeled == toa_obs {
            return lut_aot[i];
        }
    }

    for i in 0..stoa.len().saturating_sub(1) {
        let (lo, hi) = (stoa[i], stoa[i + 1]);
        if (lo < toa_obs && toa_obs < hi) || (hi < toa_obs && toa_obs < lo) {
            return lerp(lo, lut_aot[i], hi, lut_aot[i + 1], toa_obs);
        }
    }

    f32::NAN
}
