use crate::core::cloud_mask::{is_cloudy, CloudScreenParams};
use crate::core::interpolate::{DomainPolicy, LutInterpolator};
use crate::core::inversion::invert_aot;
use crate::io::lut::Lut;
use crate::io::swath::{AotField, SwathProduct};
use crate::types::{AodResult, Band, Geometry};
use serde::{Deserialize, Serialize};

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub cloud: CloudScreenParams,
    pub domain_policy: DomainPolicy,
    /// Open physical range for an accepted AOT result
    pub aot_min: f32,
    pub aot_max: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            cloud: CloudScreenParams::default(),
            domain_policy: DomainPolicy::default(),
            aot_min: 0.0,
            aot_max: 6.0,
        }
    }
}

/// Diagnostic pixel tally for one retrieval run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalCounts {
    /// Pixels screened out before inversion
    pub cloudy: u64,
    /// Pixels whose geometry was rejected by the domain policy
    pub out_of_domain: u64,
    /// Pixels with no TOA bracket or a result outside the physical range
    pub out_of_range: u64,
    /// Pixels with an accepted AOT
    pub success: u64,
}

impl RetrievalCounts {
    pub fn total(&self) -> u64 {
        self.cloudy + self.out_of_domain + self.out_of_range + self.success
    }
}

impl std::ops::AddAssign for RetrievalCounts {
    fn add_assign(&mut self, other: Self) {
        self.cloudy += other.cloudy;
        self.out_of_domain += other.out_of_domain;
        self.out_of_range += other.out_of_range;
        self.success += other.success;
    }
}

/// Result of a retrieval run: the output field plus the pixel tally
#[derive(Debug, Clone)]
pub struct RetrievalOutput {
    pub field: AotField,
    pub counts: RetrievalCounts,
}

/// Per-pixel AOD retrieval over a swath.
///
/// Holds the read-only table for the lifetime of the run. Each pixel is
/// screened for cloud, interpolated to its observation geometry, and
/// inverted independently; per-pixel failures become NaN cells and counter
/// increments, never run aborts.
pub struct RetrievalProcessor {
    lut: Lut,
    params: RetrievalParams,
}

impl RetrievalProcessor {
    /// Create a processor with default parameters
    pub fn new(lut: Lut) -> Self {
        Self {
            lut,
            params: RetrievalParams::default(),
        }
    }

    /// Create a processor with custom parameters
    pub fn with_params(lut: Lut, params: RetrievalParams) -> Self {
        Self { lut, params }
    }

    pub fn lut(&self) -> &Lut {
        &self.lut
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Screen, interpolate, and invert one pixel
    fn retrieve_pixel(
        &self,
        swath: &SwathProduct,
        interp: &LutInterpolator<'_>,
        row: usize,
        col: usize,
        counts: &mut RetrievalCounts,
    ) -> f32 {
        if is_cloudy(&swath.blue, &swath.ir, row, col, &self.params.cloud) {
            counts.cloudy += 1;
            return f32::NAN;
        }

        let geometry = Geometry::new(
            swath.sza[[row, col]],
            swath.vza[[row, col]],
            swath.raa[[row, col]],
        );
        let profile = match interp.interpolate(&geometry) {
            Ok(profile) => profile,
            Err(_) => {
                counts.out_of_domain += 1;
                return f32::NAN;
            }
        };

        let aot = invert_aot(
            &profile,
            &self.lut.axes.aot,
            swath.csr[[row, col]],
            swath.toa[[row, col]],
        );
        if aot.is_finite() && self.params.aot_min < aot && aot < self.params.aot_max {
            counts.success += 1;
            aot
        } else {
            counts.out_of_range += 1;
            f32::NAN
        }
    }

    /// Run the retrieval sequentially over the pixel grid
    pub fn run(&self, swath: &SwathProduct) -> AodResult<RetrievalOutput> {
        let (rows, cols) = swath.dim();
        log::info!("Retrieving AOT over {} x {} pixels", rows, cols);
        log::debug!("Parameters: {:?}", self.params);

        let interp = LutInterpolator::with_policy(&self.lut, self.params.domain_policy);
        let mut aot = Band::from_elem((rows, cols), f32::NAN);
        let mut counts = RetrievalCounts::default();

        for row in 0..rows {
            for col in 0..cols {
                aot[[row, col]] = self.retrieve_pixel(swath, &interp, row, col, &mut counts);
            }
        }

        self.log_tally(&counts);
        Ok(self.assemble_output(swath, aot, counts))
    }

    /// Run the retrieval with the pixel loop fanned out over rows.
    ///
    /// Every pixel depends only on the read-only table and band arrays and
    /// writes a private output cell, so rows are processed independently;
    /// each worker accumulates its own counters, merged at the end. Results
    /// are identical to [`RetrievalProcessor::run`].
    #[cfg(feature = "parallel")]
    pub fn run_parallel(&self, swath: &SwathProduct) -> AodResult<RetrievalOutput> {
        use rayon::prelude::*;

        let (rows, cols) = swath.dim();
        log::info!(
            "Retrieving AOT over {} x {} pixels ({} workers)",
            rows,
            cols,
            rayon::current_num_threads()
        );
        log::debug!("Parameters: {:?}", self.params);

        let interp = LutInterpolator::with_policy(&self.lut, self.params.domain_policy);

        let row_results: Vec<(Vec<f32>, RetrievalCounts)> = (0..rows)
            .into_par_iter()
            .map(|row| {
                let mut values = Vec::with_capacity(cols);
                let mut counts = RetrievalCounts::default();
                for col in 0..cols {
                    values.push(self.retrieve_pixel(swath, &interp, row, col, &mut counts));
                }
                (values, counts)
            })
            .collect();

        let mut counts = RetrievalCounts::default();
        let mut flat = Vec::with_capacity(rows * cols);
        for (values, row_counts) in row_results {
            flat.extend(values);
            counts += row_counts;
        }
        let aot = Band::from_shape_vec((rows, cols), flat).map_err(|e| {
            crate::types::AodError::Processing(format!("row reassembly failed: {}", e))
        })?;

        self.log_tally(&counts);
        Ok(self.assemble_output(swath, aot, counts))
    }

    fn assemble_output(
        &self,
        swath: &SwathProduct,
        aot: Band,
        counts: RetrievalCounts,
    ) -> RetrievalOutput {
        RetrievalOutput {
            field: AotField {
                aot,
                lat: swath.lat.clone(),
                lon: swath.lon.clone(),
            },
            counts,
        }
    }

    fn log_tally(&self, counts: &RetrievalCounts) {
        log::info!(
            "Retrieval finished: {} cloudy, {} out of domain, {} out of range, {} success",
            counts.cloudy,
            counts.out_of_domain,
            counts.out_of_range,
            counts.success
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inversion::{forward_toa, model_curve};
    use crate::io::lut::{LutAxes, NodeCoefficients};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    /// Single-geometry table with two AOT nodes and a monotone model curve
    fn point_lut() -> Lut {
        Lut::new(
            LutAxes {
                sza: vec![30.0],
                vza: vec![20.0],
                raa: vec![90.0],
                aot: vec![0.1, 0.5],
            },
            vec![0.10, 0.15],
            vec![0.80, 0.75],
            vec![0.70, 0.65],
            vec![0.90, 0.90],
            vec![0.02, 0.05],
        )
        .unwrap()
    }

    fn point_swath(toa: f32, csr: f32) -> SwathProduct {
        let fill = |v: f32| Array2::from_elem((1, 1), v);
        SwathProduct::new(
            fill(toa),
            fill(csr),
            fill(0.05),
            fill(0.0),
            fill(30.0),
            fill(20.0),
            fill(90.0),
            fill(35.8),
            fill(116.9),
        )
        .unwrap()
    }

    /// Observed TOA whose true inverse lies at the given AOT by construction
    fn toa_for(lut: &Lut, csr: f32, aot: f32) -> f32 {
        let nodes: Vec<NodeCoefficients> =
            (0..lut.n_aot()).map(|i| lut.node_coefficients(i, 0, 0, 0)).collect();
        let stoa = model_curve(&nodes, csr);
        let frac = (aot - lut.axes.aot[0]) / (lut.axes.aot[1] - lut.axes.aot[0]);
        stoa[0] + (stoa[1] - stoa[0]) * frac
    }

    #[test]
    fn test_end_to_end_point_retrieval() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = toa_for(&lut, csr, 0.3);

        let processor = RetrievalProcessor::new(lut);
        let output = processor.run(&point_swath(toa, csr)).unwrap();

        assert_relative_eq!(output.field.aot[[0, 0]], 0.3, epsilon = 1e-5);
        assert_eq!(output.counts.success, 1);
        assert_eq!(output.counts.total(), 1);
        // Lat/lon pass through unchanged
        assert_eq!(output.field.lat[[0, 0]], 35.8);
        assert_eq!(output.field.lon[[0, 0]], 116.9);
    }

    #[test]
    fn test_exact_node_observation_recovers_node_aot() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = forward_toa(&lut.node_coefficients(0, 0, 0, 0), csr);

        let processor = RetrievalProcessor::new(lut);
        let output = processor.run(&point_swath(toa, csr)).unwrap();
        assert_eq!(output.field.aot[[0, 0]], 0.1);
    }

    #[test]
    fn test_cloudy_pixel_is_nan_and_counted() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = toa_for(&lut, csr, 0.3);

        let mut swath = point_swath(toa, csr);
        swath.blue = Array2::from_elem((1, 1), 0.5);

        let processor = RetrievalProcessor::new(lut);
        let output = processor.run(&swath).unwrap();
        assert!(output.field.aot[[0, 0]].is_nan());
        assert_eq!(output.counts.cloudy, 1);
        assert_eq!(output.counts.success, 0);
    }

    #[test]
    fn test_out_of_domain_geometry_is_counted_under_reject() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = toa_for(&lut, csr, 0.3);

        let mut swath = point_swath(toa, csr);
        swath.sza = Array2::from_elem((1, 1), 45.0);

        let processor = RetrievalProcessor::new(lut);
        let output = processor.run(&swath).unwrap();
        assert!(output.field.aot[[0, 0]].is_nan());
        assert_eq!(output.counts.out_of_domain, 1);
    }

    #[test]
    fn test_out_of_domain_geometry_clamps_under_clamp() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = toa_for(&lut, csr, 0.3);

        let mut swath = point_swath(toa, csr);
        swath.sza = Array2::from_elem((1, 1), 45.0);

        let params = RetrievalParams {
            domain_policy: DomainPolicy::Clamp,
            ..RetrievalParams::default()
        };
        let processor = RetrievalProcessor::with_params(lut, params);
        let output = processor.run(&swath).unwrap();
        assert_relative_eq!(output.field.aot[[0, 0]], 0.3, epsilon = 1e-5);
        assert_eq!(output.counts.success, 1);
    }

    #[test]
    fn test_unbracketed_observation_is_out_of_range() {
        let lut = point_lut();
        let processor = RetrievalProcessor::new(lut);

        let output = processor.run(&point_swath(0.9, 0.05)).unwrap();
        assert!(output.field.aot[[0, 0]].is_nan());
        assert_eq!(output.counts.out_of_range, 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let lut = point_lut();
        let csr = 0.05;
        let toa = toa_for(&lut, csr, 0.3);

        // 4x3 grid mixing clear, cloudy, and out-of-range pixels
        let mut swath = SwathProduct::new(
            Array2::from_elem((4, 3), toa),
            Array2::from_elem((4, 3), csr),
            Array2::from_elem((4, 3), 0.05),
            Array2::from_elem((4, 3), 0.0),
            Array2::from_elem((4, 3), 30.0),
            Array2::from_elem((4, 3), 20.0),
            Array2::from_elem((4, 3), 90.0),
            Array2::from_elem((4, 3), 35.8),
            Array2::from_elem((4, 3), 116.9),
        )
        .unwrap();
        swath.blue[[0, 0]] = 0.5;
        swath.toa[[2, 1]] = 0.9;

        let processor = RetrievalProcessor::new(lut);
        let sequential = processor.run(&swath).unwrap();
        let parallel = processor.run_parallel(&swath).unwrap();

        assert_eq!(sequential.counts, parallel.counts);
        for (a, b) in sequential.field.aot.iter().zip(parallel.field.aot.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}
