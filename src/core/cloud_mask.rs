use crate::types::Band;
use serde::{Deserialize, Serialize};

/// How border pixels, whose 3x3 neighborhood exceeds the grid, are screened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgePolicy {
    /// Same statistical test everywhere, neighborhood clamped to the grid
    /// bounds (a corner pixel sees its 2x2 block). Reference behavior.
    #[default]
    Simplified,
    /// Historical variant: border pixels are cloudy iff the center blue value
    /// exceeds `blue_th2` and the center infrared value exceeds `ir_th2`;
    /// only interior pixels take the full statistical test.
    BorderSpecialCase,
}

/// Cloud screening thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudScreenParams {
    /// Threshold on the blue-band composite statistic `mean * std * 3`
    pub blue_th1: f32,
    /// Upper limit on the center pixel's blue reflectance
    pub blue_th2: f32,
    /// Threshold on the infrared-band neighborhood standard deviation
    pub ir_th1: f32,
    /// Upper limit on the center pixel's infrared reflectance
    pub ir_th2: f32,
    pub edge_policy: EdgePolicy,
}

impl Default for CloudScreenParams {
    fn default() -> Self {
        Self {
            blue_th1: 0.0025,
            blue_th2: 0.4,
            ir_th1: 0.003,
            ir_th2: 0.025,
            edge_policy: EdgePolicy::default(),
        }
    }
}

/// Neighborhood mean, population standard deviation, and minimum over the
/// 3x3 window around (row, col), clamped to the grid bounds
fn neighborhood_stats(band: &Band, row: usize, col: usize) -> (f32, f32, f32) {
    let (rows, cols) = band.dim();
    let r0 = row.saturating_sub(1);
    let r1 = (row + 1).min(rows - 1);
    let c0 = col.saturating_sub(1);
    let c1 = (col + 1).min(cols - 1);

    let mut sum = 0.0f32;
    let mut min = f32::INFINITY;
    let mut n = 0u32;
    for r in r0..=r1 {
        for c in c0..=c1 {
            let v = band[[r, c]];
            sum += v;
            min = min.min(v);
            n += 1;
        }
    }
    let mean = sum / n as f32;

    let mut var = 0.0f32;
    for r in r0..=r1 {
        for c in c0..=c1 {
            let d = band[[r, c]] - mean;
            var += d * d;
        }
    }
    (mean, (var / n as f32).sqrt(), min)
}

/// Local-neighborhood cloud test for one pixel.
///
/// A pixel is clear only when all four sub-conditions hold:
/// - blue composite statistic `mean * std * 3` is below `blue_th1`, OR it is
///   above while the neighborhood standard deviation stays below
///   `3 * blue_th1` and every neighborhood value is positive;
/// - the center blue value is at most `blue_th2`;
/// - the infrared neighborhood standard deviation is below `ir_th1` and every
///   neighborhood value exceeds -0.1;
/// - the center infrared value is at most `ir_th2`.
///
/// Pure function of the two band arrays and the coordinate; no side effects.
pub fn is_cloudy(blue: &Band, ir: &Band, row: usize, col: usize, params: &CloudScreenParams) -> bool {
    debug_assert_eq!(blue.dim(), ir.dim());
    let (rows, cols) = blue.dim();

    if params.edge_policy == EdgePolicy::BorderSpecialCase
        && (row == 0 || col == 0 || row + 1 == rows || col + 1 == cols)
    {
        return blue[[row, col]] > params.blue_th2 && ir[[row, col]] > params.ir_th2;
    }

    let (blue_mean, blue_std, blue_min) = neighborhood_stats(blue, row, col);
    let blue_stat = blue_mean * blue_std * 3.0;
    let blue_clear_stats = blue_stat < params.blue_th1
        || (blue_std < 3.0 * params.blue_th1 && blue_min > 0.0);
    let blue_clear_center = blue[[row, col]] <= params.blue_th2;

    let (_, ir_std, ir_min) = neighborhood_stats(ir, row, col);
    let ir_clear_stats = ir_std < params.ir_th1 && ir_min > -0.1;
    let ir_clear_center = ir[[row, col]] <= params.ir_th2;

    !(blue_clear_stats && blue_clear_center && ir_clear_stats && ir_clear_center)
}
