use crate::types::{AodError, AodResult};

/// Forward-model coefficients at one (AOT, SZA, VZA, RAA) node.
///
/// The spherical albedo `s` varies only with AOT and the transmittances only
/// with (AOT, SZA, VZA); they are carried alongside the fully angle-resolved
/// path reflectance so a single node always evaluates the forward model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCoefficients {
    /// Spherical albedo
    pub s: f32,
    /// Downward scattering transmittance
    pub tdn: f32,
    /// Upward scattering transmittance
    pub tup: f32,
    /// Total gaseous transmittance
    pub t: f32,
    /// Path reflectance
    pub p: f32,
}

/// The four sampling axes of the lookup table.
///
/// Angles are in degrees within [0, 180]; AOT is at 550 nm. Every axis is
/// strictly ascending and at most 255 samples long (the header stores each
/// length in a single byte).
#[derive(Debug, Clone, PartialEq)]
pub struct LutAxes {
    pub sza: Vec<f32>,
    pub vza: Vec<f32>,
    pub raa: Vec<f32>,
    pub aot: Vec<f32>,
}

impl LutAxes {
    fn validate(&self) -> AodResult<()> {
        for (name, axis) in [
            ("sza", &self.sza),
            ("vza", &self.vza),
            ("raa", &self.raa),
            ("aot", &self.aot),
        ] {
            if axis.is_empty() {
                return Err(AodError::CorruptLut(format!("empty {} axis", name)));
            }
            if axis.len() > u8::MAX as usize {
                return Err(AodError::CorruptLut(format!(
                    "{} axis has {} samples, header limit is {}",
                    name,
                    axis.len(),
                    u8::MAX
                )));
            }
            if axis.iter().any(|v| !v.is_finite()) {
                return Err(AodError::CorruptLut(format!(
                    "non-finite sample on {} axis",
                    name
                )));
            }
            if axis.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AodError::CorruptLut(format!(
                    "{} axis is not strictly ascending",
                    name
                )));
            }
        }
        if self.aot[0] <= 0.0 {
            return Err(AodError::CorruptLut(
                "aot axis must be strictly positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Precomputed radiative-transfer lookup table.
///
/// Storage is a record of flat arrays keyed by explicit integer indices, with
/// each coefficient indexed only by the dimensions it varies over:
/// `s[aot]`, `tdn/tup/t[aot, sza, vza]`, `p[aot, sza, vza, raa]`.
/// Traversal order is AOT outermost, then SZA, then VZA, then RAA innermost;
/// the binary layout follows the same order.
///
/// The table is built once by the external simulator driver and loaded
/// read-only for the lifetime of a retrieval run.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut {
    pub axes: LutAxes,
    /// Spherical albedo, one per AOT node
    pub s: Vec<f32>,
    /// Downward scattering transmittance per (AOT, SZA, VZA)
    pub tdn: Vec<f32>,
    /// Upward scattering transmittance per (AOT, SZA, VZA)
    pub tup: Vec<f32>,
    /// Total gaseous transmittance per (AOT, SZA, VZA)
    pub t: Vec<f32>,
    /// Path reflectance per (AOT, SZA, VZA, RAA)
    pub p: Vec<f32>,
}

impl Lut {
    /// Build a table from axes and coefficient arrays, validating lengths.
    pub fn new(
        axes: LutAxes,
        s: Vec<f32>,
        tdn: Vec<f32>,
        tup: Vec<f32>,
        t: Vec<f32>,
        p: Vec<f32>,
    ) -> AodResult<Self> {
        axes.validate()?;

        let n_trans = axes.aot.len() * axes.sza.len() * axes.vza.len();
        let n_path = n_trans * axes.raa.len();
        if s.len() != axes.aot.len() {
            return Err(AodError::CorruptLut(format!(
                "spherical albedo has {} entries, expected {}",
                s.len(),
                axes.aot.len()
            )));
        }
        for (name, arr) in [("tdn", &tdn), ("tup", &tup), ("t", &t)] {
            if arr.len() != n_trans {
                return Err(AodError::CorruptLut(format!(
                    "{} has {} entries, expected {}",
                    name,
                    arr.len(),
                    n_trans
                )));
            }
        }
        if p.len() != n_path {
            return Err(AodError::CorruptLut(format!(
                "path reflectance has {} entries, expected {}",
                p.len(),
                n_path
            )));
        }

        Ok(Self {
            axes,
            s,
            tdn,
            tup,
            t,
            p,
        })
    }

    pub fn n_sza(&self) -> usize {
        self.axes.sza.len()
    }

    pub fn n_vza(&self) -> usize {
        self.axes.vza.len()
    }

    pub fn n_raa(&self) -> usize {
        self.axes.raa.len()
    }

    pub fn n_aot(&self) -> usize {
        self.axes.aot.len()
    }

    /// Total encoded size in bytes for the given axis lengths
    fn encoded_len(n_sza: usize, n_vza: usize, n_raa: usize, n_aot: usize) -> usize {
        let header = 4 + 4 * (n_sza + n_vza + n_raa + n_aot);
        let per_aot_slice = 4 + n_sza * n_vza * (12 + 4 * n_raa);
        header + n_aot * per_aot_slice
    }

    fn trans_index(&self, aot_idx: usize, sza_idx: usize, vza_idx: usize) -> usize {
        (aot_idx * self.n_sza() + sza_idx) * self.n_vza() + vza_idx
    }

    /// Spherical albedo at an AOT node
    pub fn spherical_albedo(&self, aot_idx: usize) -> f32 {
        self.s[aot_idx]
    }

    /// (tdn, tup, t) at an (AOT, SZA, VZA) node
    pub fn transmittance(&self, aot_idx: usize, sza_idx: usize, vza_idx: usize) -> (f32, f32, f32) {
        let idx = self.trans_index(aot_idx, sza_idx, vza_idx);
        (self.tdn[idx], self.tup[idx], self.t[idx])
    }

    /// Path reflectance at a full (AOT, SZA, VZA, RAA) node
    pub fn path_reflectance(
        &self,
        aot_idx: usize,
        sza_idx: usize,
        vza_idx: usize,
        raa_idx: usize,
    ) -> f32 {
        self.p[self.trans_index(aot_idx, sza_idx, vza_idx) * self.n_raa() + raa_idx]
    }

    /// Full coefficient set at a grid node
    pub fn node_coefficients(
        &self,
        aot_idx: usize,
        sza_idx: usize,
        vza_idx: usize,
        raa_idx: usize,
    ) -> NodeCoefficients {
        let (tdn, tup, t) = self.transmittance(aot_idx, sza_idx, vza_idx);
        NodeCoefficients {
            s: self.spherical_albedo(aot_idx),
            tdn,
            tup,
            t,
            p: self.path_reflectance(aot_idx, sza_idx, vza_idx, raa_idx),
        }
    }

    /// Decode a table from its little-endian binary representation.
    ///
    /// The stream must be consumed exactly; any trailing or missing bytes fail
    /// with [`AodError::CorruptLut`]. There is no partial-table recovery.
    pub fn decode(bytes: &[u8]) -> AodResult<Self> {
        if bytes.len() < 4 {
            return Err(AodError::CorruptLut(format!(
                "file is {} bytes, too short for the count header",
                bytes.len()
            )));
        }

        let n_sza = bytes[0] as usize;
        let n_vza = bytes[1] as usize;
        let n_raa = bytes[2] as usize;
        let n_aot = bytes[3] as usize;
        if n_sza == 0 || n_vza == 0 || n_raa == 0 || n_aot == 0 {
            return Err(AodError::CorruptLut(format!(
                "zero axis length in header ({}, {}, {}, {})",
                n_sza, n_vza, n_raa, n_aot
            )));
        }

        let expected = Self::encoded_len(n_sza, n_vza, n_raa, n_aot);
        if bytes.len() != expected {
            return Err(AodError::CorruptLut(format!(
                "file is {} bytes, header implies {}",
                bytes.len(),
                expected
            )));
        }

        let mut pos = 4;
        let mut read_f32s = |count: usize| -> Vec<f32> {
            let out = bytes[pos..pos + 4 * count]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            pos += 4 * count;
            out
        };

        let axes = LutAxes {
            sza: read_f32s(n_sza),
            vza: read_f32s(n_vza),
            raa: read_f32s(n_raa),
            aot: read_f32s(n_aot),
        };

        let n_trans = n_aot * n_sza * n_vza;
        let mut s = Vec::with_capacity(n_aot);
        let mut tdn = Vec::with_capacity(n_trans);
        let mut tup = Vec::with_capacity(n_trans);
        let mut t = Vec::with_capacity(n_trans);
        let mut p = Vec::with_capacity(n_trans * n_raa);

        for _ in 0..n_aot {
            s.push(read_f32s(1)[0]);
            for _ in 0..n_sza {
                for _ in 0..n_vza {
                    let triplet = read_f32s(3);
                    tdn.push(triplet[0]);
                    tup.push(triplet[1]);
                    t.push(triplet[2]);
                    p.extend(read_f32s(n_raa));
                }
            }
        }
        debug_assert_eq!(pos, bytes.len());

        log::debug!(
            "Decoded LUT: {} sza x {} vza x {} raa x {} aot nodes",
            n_sza,
            n_vza,
            n_raa,
            n_aot
        );

        Self::new(axes, s, tdn, tup, t, p)
    }

    /// Encode the table to its little-endian binary representation.
    ///
    /// Layout: Header1 with the four axis lengths as single bytes, Header2
    /// with the four f32 axis arrays in SZA, VZA, RAA, AOT order, then per
    /// AOT slice the spherical albedo followed by (tdn, tup, t) and the RAA
    /// row of path reflectances for each (SZA, VZA) pair, SZA outer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(
            self.n_sza(),
            self.n_vza(),
            self.n_raa(),
            self.n_aot(),
        ));

        out.push(self.n_sza() as u8);
        out.push(self.n_vza() as u8);
        out.push(self.n_raa() as u8);
        out.push(self.n_aot() as u8);
        for axis in [&self.axes.sza, &self.axes.vza, &self.axes.raa, &self.axes.aot] {
            for v in axis {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }

        for i in 0..self.n_aot() {
            out.extend_from_slice(&self.s[i].to_le_bytes());
            for j in 0..self.n_sza() {
                for k in 0..self.n_vza() {
                    let (tdn, tup, t) = self.transmittance(i, j, k);
                    out.extend_from_slice(&tdn.to_le_bytes());
                    out.extend_from_slice(&tup.to_le_bytes());
                    out.extend_from_slice(&t.to_le_bytes());
                    for l in 0..self.n_raa() {
                        out.extend_from_slice(&self.path_reflectance(i, j, k, l).to_le_bytes());
                    }
                }
            }
        }

        out
    }

    /// Load a table from a LUT file on disk
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> AodResult<Self> {
        let path = path.as_ref();
        log::info!("Loading LUT from {}", path.display());

        let bytes = std::fs::read(path)?;
        let lut = Self::decode(&bytes)?;

        log::info!(
            "Loaded LUT: {} sza x {} vza x {} raa samples, {} AOT nodes ({} bytes)",
            lut.n_sza(),
            lut.n_vza(),
            lut.n_raa(),
            lut.n_aot(),
            bytes.len()
        );
        Ok(lut)
    }

    /// Write the table to a LUT file on disk
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> AodResult<()> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }
}
