//! Parsing and lookup for the boundary velocity field.
//!
//! Beyond the reconstructed cube only a sparse, radius-averaged velocity
//! field is available. Each model ships it as a whitespace-delimited table
//! with a header row and columns `z Vsgx Vsgy Vsgz`, sorted ascending by
//! redshift. Queries address it by redshift through a binary search.

use std::path::Path;

use anyhow::Context;
use rkyv::{Archive, Deserialize, Serialize};

/// Redshift-ordered boundary velocity field, stored as columns.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct BoundaryField {
    /// CMB-frame redshift of each boundary point, ascending.
    pub z: Vec<f64>,
    /// Supergalactic Cartesian velocity `[Vsgx, Vsgy, Vsgz]` per point, km/s.
    pub velocity: Vec<[f64; 3]>,
}

impl BoundaryField {
    /// Build a field from matching redshift and velocity columns.
    ///
    /// The columns must be the same length, non-empty, and sorted
    /// ascending by redshift.
    pub fn new(z: Vec<f64>, velocity: Vec<[f64; 3]>) -> anyhow::Result<Self> {
        anyhow::ensure!(!z.is_empty(), "boundary field is empty");
        anyhow::ensure!(
            z.len() == velocity.len(),
            "boundary field has {} redshifts but {} velocity rows",
            z.len(),
            velocity.len()
        );
        anyhow::ensure!(
            z.windows(2).all(|w| w[0] <= w[1]),
            "boundary field redshift column is not sorted ascending"
        );
        Ok(Self { z, velocity })
    }

    /// Number of boundary points.
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// Return `true` when the field holds no points.
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Left insertion position of `z_cmb` in the redshift column: the
    /// first index whose redshift is >= `z_cmb`, which may be `len()`.
    pub fn insertion_index(&self, z_cmb: f64) -> usize {
        self.z.partition_point(|&zi| zi < z_cmb)
    }

    /// Boundary velocity for insertion index `k`, clamping past-the-end
    /// indices to the outermost point.
    pub fn velocity_at(&self, k: usize) -> [f64; 3] {
        self.velocity[k.min(self.velocity.len() - 1)]
    }
}

/// Parse one boundary record: `z Vsgx Vsgy Vsgz`, whitespace-delimited.
fn parse_boundary_point(record: &str) -> Option<(f64, [f64; 3])> {
    let mut fields = record.split_whitespace();
    let z = fields.next()?.parse().ok()?;
    let vx = fields.next()?.parse().ok()?;
    let vy = fields.next()?.parse().ok()?;
    let vz = fields.next()?.parse().ok()?;
    Some((z, [vx, vy, vz]))
}

/// Parse a boundary field table from an in-memory string.
///
/// The first line is a header and is skipped; lines that fail to parse
/// are dropped.
pub fn parse_boundary_field(data: &str) -> anyhow::Result<BoundaryField> {
    let (z, velocity) = data
        .lines()
        .skip(1)
        .filter_map(parse_boundary_point)
        .unzip();
    BoundaryField::new(z, velocity)
}

/// Load a boundary field table from a file.
pub fn load_boundary_field_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<BoundaryField> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading boundary table {}", path.display()))?;
    parse_boundary_field(&data).with_context(|| format!("parsing {}", path.display()))
}
