//! # pvhub
//!
//! Peculiar-velocity corrections from reconstructed velocity fields.
//!
//! Given a sky position (ICRS RA/Dec) and a CMB-frame redshift, this crate
//! estimates the **peculiar velocity** — the deviation from pure
//! Hubble-flow recession — at that point, by querying one of four
//! precomputed reconstruction models derived from galaxy redshift surveys
//! (2M++, 2MRS and their SDSS/6dF extensions). The estimate is what
//! standard-candle and standard-siren analyses use to correct observed
//! redshifts into distances.
//!
//! ## Example
//!
//! ```no_run
//! use pvhub::ModelStore;
//!
//! // Tables live in a data directory; model 0 is 2M++_SDSS.
//! let mut store = ModelStore::new("data");
//! store.select(0).unwrap();
//!
//! // One line of sight, three redshifts. Velocities come back in km/s,
//! // rounded to integer values; NaN marks physically undefined points.
//! let pv = store
//!     .calculate_pv(180.0, 0.0, &[0.005, 0.02, 0.08], true)
//!     .unwrap();
//! println!("peculiar velocities: {:?} km/s", pv);
//! ```
//!
//! ## How a query is answered
//!
//! 1. The redshift is converted to the recession-velocity proxy
//!    `cz = c · z_cmb` and the sky position rotated into supergalactic
//!    Cartesian coordinates, the frame the reconstructions are gridded in.
//! 2. Inside the reconstructed volume (a 129³ grid spanning
//!    ±20,000 km/s per axis) the cell's precomputed projected velocity is
//!    returned directly.
//! 3. Outside it, the velocity is extrapolated radially from a sparse
//!    boundary field: the boundary velocity at the query redshift,
//!    projected onto the line of sight.
//! 4. Near the survey's ragged edge the grid holds NaN cells; those are
//!    rescued with the radial extrapolation, except around the
//!    reconstruction's center where the peculiar velocity is genuinely
//!    undefined and NaN is the answer.
//!
//! ## Credits
//!
//! The method and the model data follow the pvhub peculiar-velocity
//! correction code (Erik Peterson et al., arXiv:2110.03487); model
//! reconstructions by Said et al. 2020, Carr et al. 2021, Lilow & Nusser
//! 2021 and Carrick et al. 2015.

pub mod frames;
pub mod model;
pub mod resolver;
/// Raw model tables: dense grid table & sparse boundary field.
pub(crate) mod tables;

pub use frames::equatorial_to_supergalactic;
pub use model::{ModelPreset, ModelStore, UnknownModelError, VelocityModel, DEFAULT_DATA_DIR};
pub use resolver::{
    PvEstimate, CZ_BOUNDARY_KM_S, C_LIGHT_KM_S, DMAX, DMIN, GRID_CELLS, NBINS,
    RESCUE_MIN_REDSHIFT,
};
pub use tables::outside::BoundaryField;

// Positions and velocities are km/s-scale values queried to sub-km/s
// differences; all the math runs in 64-bit.
pub type Vector3 = nalgebra::Vector3<f64>;
