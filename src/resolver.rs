//! Peculiar-velocity estimation against a loaded model.
//!
//! The query pipeline, per redshift:
//!
//! 1. Convert the CMB-frame redshift to the recession-velocity proxy
//!    `cz` and rotate (RA, Dec, cz) into supergalactic Cartesian
//!    coordinates. `cz` is *not* a distance, but treating it as one is
//!    self-consistent with how the reconstruction encodes its radial
//!    coordinate.
//! 2. Snap the position to the 129³ reconstruction grid and look up the
//!    projected velocity of that cell.
//! 3. Classify the point against the reconstructed volume: `cz` below the
//!    survey boundary and every coordinate strictly within the cube.
//! 4. Outside the volume, extrapolate radially from the boundary velocity
//!    field: project the boundary velocity at the query redshift onto the
//!    line of sight.
//!
//! The reconstructed volume is not spherical, so grid cells near its edge
//! (and around its center) hold NaN. A NaN lookup at a redshift safely
//! away from the center is rescued with the radial extrapolation; at the
//! center the peculiar velocity is physically undefined and NaN is the
//! answer.

use crate::frames::equatorial_to_supergalactic;
use crate::model::VelocityModel;

/// Speed of light in km/s.
pub const C_LIGHT_KM_S: f64 = 299792.458;

/// Lower edge of the reconstruction cube on each axis, km/s.
pub const DMIN: f64 = -20000.0;
/// Upper edge of the reconstruction cube on each axis, km/s.
pub const DMAX: f64 = 20000.0;
/// Grid resolution per axis.
pub const NBINS: usize = 129;
/// Total grid cells, `NBINS³`.
pub const GRID_CELLS: usize = NBINS * NBINS * NBINS;

/// Precise `cz` boundary of the reconstructed volume, km/s. Empirical
/// constant tied to the survey geometry; do not re-derive.
pub const CZ_BOUNDARY_KM_S: f64 = 19942.0;

/// Minimum redshift at which a NaN grid lookup is rescued by the radial
/// extrapolation. Below it the point sits near the reconstruction's
/// center, where the peculiar velocity is undefined.
pub const RESCUE_MIN_REDSHIFT: f64 = 0.01;

/// Grid spacing along each axis, km/s.
const BIN_SIZE: f64 = (DMAX - DMIN) / (NBINS as f64 - 1.0);

// ── Result type ─────────────────────────────────────────────────────────────

/// A single peculiar-velocity estimate, km/s, rounded to the nearest
/// integer value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PvEstimate {
    /// The query fell inside the reconstructed volume; the value is the
    /// grid cell's projected velocity.
    Inside(f64),
    /// The query fell outside the volume (or in a NaN edge cell) and was
    /// radially extrapolated from the boundary field.
    Extrapolated(f64),
    /// No defined velocity: the reconstruction's central region, or an
    /// out-of-volume query with extrapolation disabled.
    Undefined,
}

impl PvEstimate {
    /// Collapse to a plain number, with `Undefined` as NaN.
    pub fn value(self) -> f64 {
        match self {
            Self::Inside(v) | Self::Extrapolated(v) => v,
            Self::Undefined => f64::NAN,
        }
    }

    /// Return `true` unless the estimate is `Undefined`.
    pub fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }
}

// ── Estimation ──────────────────────────────────────────────────────────────

impl VelocityModel {
    /// Estimate the peculiar velocity for one observation.
    ///
    /// `ra_deg`/`dec_deg` are ICRS coordinates in degrees, `z_cmb` the
    /// CMB-frame redshift. With `extrapolation` disabled, queries outside
    /// the reconstructed volume are `Undefined` instead of extrapolated.
    pub fn estimate(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        z_cmb: f64,
        extrapolation: bool,
    ) -> PvEstimate {
        let cz = C_LIGHT_KM_S * z_cmb;
        let p = equatorial_to_supergalactic(ra_deg, dec_deg, cz);

        let grid_value = self.vproj[flat_grid_index(p.x, p.y, p.z)];
        let inside = cz < CZ_BOUNDARY_KM_S
            && (DMIN < p.x && p.x < DMAX)
            && (DMIN < p.y && p.y < DMAX)
            && (DMIN < p.z && p.z < DMAX);

        // Radial extrapolation from the boundary field: the boundary
        // velocity at this redshift projected onto the line of sight.
        // At the exact center r = 0 and the division is left to produce
        // NaN, matching the physical ambiguity there.
        let k = self.boundary.insertion_index(z_cmb);
        let v = self.boundary.velocity_at(k);
        let r = p.norm();
        let extrapolated = (p.x * v[0] + p.y * v[1] + p.z * v[2]) / r;

        if !extrapolation {
            return if inside && !grid_value.is_nan() {
                PvEstimate::Inside(grid_value.round())
            } else {
                PvEstimate::Undefined
            };
        }

        if inside && !grid_value.is_nan() {
            return PvEstimate::Inside(grid_value.round());
        }
        // NaN grid cells just inside the non-spherical survey edge are
        // rescued by the extrapolation, but only at redshifts securely
        // away from the central cell.
        let rescued = !inside || z_cmb > RESCUE_MIN_REDSHIFT;
        if rescued && !extrapolated.is_nan() {
            PvEstimate::Extrapolated(extrapolated.round())
        } else {
            PvEstimate::Undefined
        }
    }

    /// Estimate peculiar velocities for a batch of redshifts along one
    /// line of sight, elementwise and shape-preserving.
    ///
    /// Returns one value per input redshift, NaN where the velocity is
    /// undefined.
    pub fn calculate_pv(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        z_cmb: &[f64],
        extrapolation: bool,
    ) -> Vec<f64> {
        z_cmb
            .iter()
            .map(|&z| self.estimate(ra_deg, dec_deg, z, extrapolation).value())
            .collect()
    }

    /// Scalar convenience wrapper around [`calculate_pv`](Self::calculate_pv).
    pub fn calculate_pv_one(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        z_cmb: f64,
        extrapolation: bool,
    ) -> f64 {
        self.estimate(ra_deg, dec_deg, z_cmb, extrapolation).value()
    }
}

/// Flattened grid index `x*129² + y*129 + z` for a supergalactic
/// position, snapping each coordinate to its nearest bin center.
///
/// Indices outside the table are clamped to 0. That lookup is a safety
/// net only: any position classifying inside the volume always produces
/// an in-range index, so a clamped value is discarded by classification.
fn flat_grid_index(x: f64, y: f64, z: f64) -> usize {
    let xbin = ((x - DMIN) / BIN_SIZE).round() as i64;
    let ybin = ((y - DMIN) / BIN_SIZE).round() as i64;
    let zbin = ((z - DMIN) / BIN_SIZE).round() as i64;
    let n = NBINS as i64;
    let flat = xbin * n * n + ybin * n + zbin;
    if (0..GRID_CELLS as i64).contains(&flat) {
        flat as usize
    } else {
        0
    }
}
