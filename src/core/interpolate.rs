use crate::io::lut::{Lut, NodeCoefficients};
use crate::types::{AodError, AodResult, Geometry};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Behavior for query angles outside the sampled axis range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DomainPolicy {
    /// Fail the query with [`AodError::OutOfDomain`]
    #[default]
    Reject,
    /// Clamp the query to the nearest axis endpoint before bracketing
    Clamp,
}

/// Univariate linear interpolation law.
///
/// Given samples `y1`, `y2` at axis positions `x1 < x2`, returns
/// `y1 + (y2 - y1) * (x - x1) / (x2 - x1)`. Equal samples short-circuit to
/// the shared value so a degenerate bracket never divides by a zero span.
pub fn lerp<T: Float>(x1: T, y1: T, x2: T, y2: T, x: T) -> T {
    if y1 == y2 {
        y1
    } else {
        y1 + (y2 - y1) * (x - x1) / (x2 - x1)
    }
}

/// The interpolation law applied field-wise to a coefficient set
fn lerp_coefficients(
    x1: f32,
    a: NodeCoefficients,
    x2: f32,
    b: NodeCoefficients,
    x: f32,
) -> NodeCoefficients {
    NodeCoefficients {
        s: lerp(x1, a.s, x2, b.s, x),
        tdn: lerp(x1, a.tdn, x2, b.tdn, x),
        tup: lerp(x1, a.tup, x2, b.tup, x),
        t: lerp(x1, a.t, x2, b.t, x),
        p: lerp(x1, a.p, x2, b.p, x),
    }
}

/// Locate the bracketing sample pair for a query on an ascending axis.
///
/// The upper bracket is the smallest index whose sample exceeds the query;
/// the lower bracket is its predecessor. A query landing exactly on a sample
/// (the final one included) degenerates to that sample's index on both sides,
/// so stored values pass through untouched. Returns the (possibly clamped)
/// query alongside the indices.
fn bracket(name: &str, axis: &[f32], x: f32, policy: DomainPolicy) -> AodResult<(usize, usize, f32)> {
    if !x.is_finite() {
        return Err(AodError::OutOfDomain(format!("{} = {} is not finite", name, x)));
    }

    let first = axis[0];
    let last = axis[axis.len() - 1];
    let x = if x < first || x > last {
        match policy {
            DomainPolicy::Reject => {
                return Err(AodError::OutOfDomain(format!(
                    "{} = {} outside sampled range [{}, {}]",
                    name, x, first, last
                )))
            }
            DomainPolicy::Clamp => x.clamp(first, last),
        }
    } else {
        x
    };

    // First index whose sample exceeds x; at least 1 since x >= axis[0]
    let upper = axis.partition_point(|&v| v <= x);
    if axis[upper - 1] == x {
        Ok((upper - 1, upper - 1, x))
    } else {
        Ok((upper - 1, upper, x))
    }
}

/// Quad-axis interpolator over a loaded table.
///
/// For a query geometry it collapses the 2x2x2 cube of angular corner nodes
/// by successive linear interpolation along SZA, then VZA, then RAA,
/// independently for every AOT node. The output profile is aligned with the
/// ascending AOT axis, ready for the inversion solver.
pub struct LutInterpolator<'a> {
    lut: &'a Lut,
    policy: DomainPolicy,
}

impl<'a> LutInterpolator<'a> {
    pub fn new(lut: &'a Lut) -> Self {
        Self {
            lut,
            policy: DomainPolicy::default(),
        }
    }

    pub fn with_policy(lut: &'a Lut, policy: DomainPolicy) -> Self {
        Self { lut, policy }
    }

    pub fn policy(&self) -> DomainPolicy {
        self.policy
    }

    /// Interpolate the per-AOT-node coefficient profile at a query geometry
    pub fn interpolate(&self, geometry: &Geometry) -> AodResult<Vec<NodeCoefficients>> {
        let axes = &self.lut.axes;
        let (s_lo, s_hi, sza) = bracket("sza", &axes.sza, geometry.sza, self.policy)?;
        let (v_lo, v_hi, vza) = bracket("vza", &axes.vza, geometry.vza, self.policy)?;
        let (r_lo, r_hi, raa) = bracket("raa", &axes.raa, geometry.raa, self.policy)?;

        let (sza1, sza2) = (axes.sza[s_lo], axes.sza[s_hi]);
        let (vza1, vza2) = (axes.vza[v_lo], axes.vza[v_hi]);
        let (raa1, raa2) = (axes.raa[r_lo], axes.raa[r_hi]);

        let mut profile = Vec::with_capacity(self.lut.n_aot());
        for i in 0..self.lut.n_aot() {
            let corner = |j, k, l| self.lut.node_coefficients(i, j, k, l);

            // Collapse SZA: 8 corners -> 4
            let c_ll = lerp_coefficients(sza1, corner(s_lo, v_lo, r_lo), sza2, corner(s_hi, v_lo, r_lo), sza);
            let c_lh = lerp_coefficients(sza1, corner(s_lo, v_lo, r_hi), sza2, corner(s_hi, v_lo, r_hi), sza);
            let c_hl = lerp_coefficients(sza1, corner(s_lo, v_hi, r_lo), sza2, corner(s_hi, v_hi, r_lo), sza);
            let c_hh = lerp_coefficients(sza1, corner(s_lo, v_hi, r_hi), sza2, corner(s_hi, v_hi, r_hi), sza);

            // Collapse VZA: 4 -> 2
            let c_l = lerp_coefficients(vza1, c_ll, vza2, c_hl, vza);
            let c_h = lerp_coefficients(vza1, c_lh, vza2, c_hh, vza);

            // Collapse RAA: 2 -> 1
            profile.push(lerp_coefficients(raa1, c_l, raa2, c_h, raa));
        }

        Ok(profile)
    }
}
