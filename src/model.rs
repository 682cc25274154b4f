//! Model presets, the loaded velocity model, and the model store.
//!
//! Four reconstruction models ship with the published data release, each
//! as a pair of text tables: the dense grid velocity table and the sparse
//! boundary velocity field. Exactly one model is active per
//! [`ModelStore`]; selection replaces both tables atomically.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{info, warn};

use crate::resolver::GRID_CELLS;
use crate::tables::inside::load_inside_table_from_file;
use crate::tables::outside::{load_boundary_field_from_file, BoundaryField};

/// Default directory holding the distributed model tables.
pub const DEFAULT_DATA_DIR: &str = "data";

// ── Presets ─────────────────────────────────────────────────────────────────

/// One of the four published reconstruction models, selected by its
/// ordinal flag 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ModelPreset {
    /// Flag 0: 2M++_SDSS (Said et al. 2020, Peterson et al. 2021,
    /// Carr et al. 2021).
    TwoMppSdss,
    /// Flag 1: 2M++_SDSS_6dF (Said et al. 2020).
    TwoMppSdss6df,
    /// Flag 2: 2MRS (Lilow & Nusser 2021).
    TwoMrs,
    /// Flag 3: 2M++ (Carrick et al. 2015).
    TwoMpp,
}

impl ModelPreset {
    /// Resolve an ordinal model flag into a preset.
    ///
    /// Any flag outside 0..=3 is a fatal selection error.
    pub fn from_flag(flag: i64) -> Result<Self, UnknownModelError> {
        match flag {
            0 => Ok(Self::TwoMppSdss),
            1 => Ok(Self::TwoMppSdss6df),
            2 => Ok(Self::TwoMrs),
            3 => Ok(Self::TwoMpp),
            other => Err(UnknownModelError(other)),
        }
    }

    /// Ordinal flag of this preset.
    pub fn flag(self) -> i64 {
        match self {
            Self::TwoMppSdss => 0,
            Self::TwoMppSdss6df => 1,
            Self::TwoMrs => 2,
            Self::TwoMpp => 3,
        }
    }

    /// Human-readable model name.
    pub fn label(self) -> &'static str {
        match self {
            Self::TwoMppSdss => "2M++_SDSS",
            Self::TwoMppSdss6df => "2M++_SDSS_6dF",
            Self::TwoMrs => "2MRS",
            Self::TwoMpp => "2M++",
        }
    }

    /// File name of the grid velocity table within the data directory.
    pub fn inside_filename(self) -> &'static str {
        match self {
            Self::TwoMppSdss => "2MPP_SDSS.txt",
            Self::TwoMppSdss6df => "2MPP_SDSS_6dF.txt",
            Self::TwoMrs => "2MRS_redshift.txt",
            Self::TwoMpp => "2MPP_redshift.txt",
        }
    }

    /// File name of the boundary field table within the data directory.
    pub fn outside_filename(self) -> &'static str {
        match self {
            Self::TwoMppSdss => "2MPP_SDSS_out.txt",
            Self::TwoMppSdss6df => "2MPP_SDSS_6dF_out.txt",
            Self::TwoMrs => "2MRS_redshift_out.txt",
            Self::TwoMpp => "2MPP_redshift_out.txt",
        }
    }
}

/// A model flag outside the valid range 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownModelError(pub i64);

impl fmt::Display for UnknownModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model flag {} (valid flags are 0-3)", self.0)
    }
}

impl std::error::Error for UnknownModelError {}

// ── Loaded model ────────────────────────────────────────────────────────────

/// A fully loaded velocity model: the dense grid table plus the boundary
/// field, serializable with rkyv for fast reloads.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct VelocityModel {
    /// Preset this model was loaded from, `None` for ad-hoc data.
    pub preset: Option<ModelPreset>,
    /// Projected peculiar velocity per grid cell, in flattened grid
    /// order, 129³ values. NaN marks cells outside the survey volume.
    pub vproj: Vec<f64>,
    /// Boundary velocity field used for radial extrapolation.
    pub boundary: BoundaryField,
}

impl VelocityModel {
    /// Load a preset's two tables from a data directory.
    ///
    /// Loading is atomic: any failure leaves no model behind.
    pub fn load_preset<P: AsRef<Path>>(data_dir: P, preset: ModelPreset) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        info!("Loading model {} ({})", preset.flag(), preset.label());

        let vproj = load_inside_table_from_file(data_dir.join(preset.inside_filename()))?;
        let boundary = load_boundary_field_from_file(data_dir.join(preset.outside_filename()))?;
        info!(
            "Loaded {} grid cells and {} boundary points from {} / {}",
            vproj.len(),
            boundary.len(),
            preset.inside_filename(),
            preset.outside_filename()
        );

        Ok(Self {
            preset: Some(preset),
            vproj,
            boundary,
        })
    }

    /// Build a model from pre-assembled tables.
    ///
    /// `vproj` must hold exactly one value per grid cell (129³).
    pub fn from_parts(
        preset: Option<ModelPreset>,
        vproj: Vec<f64>,
        boundary: BoundaryField,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            vproj.len() == GRID_CELLS,
            "grid table has {} cells, expected {}",
            vproj.len(),
            GRID_CELLS
        );
        Ok(Self {
            preset,
            vproj,
            boundary,
        })
    }

    /// Serialize the model to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> Vec<u8> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .expect("rkyv serialization failed")
            .to_vec()
    }

    /// Save the model to a file using rkyv.
    ///
    /// Parsing the 129³-row text table dominates model load time; a saved
    /// archive reloads in a fraction of it.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let bytes = self.to_rkyv_bytes();
        std::fs::write(path, &bytes)?;
        info!("Saved model to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Load a model from an rkyv file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let model = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))?;
        info!(
            "Loaded model from {}: {} grid cells, {} boundary points",
            path.display(),
            model.vproj.len(),
            model.boundary.len()
        );
        Ok(model)
    }
}

// ── Model store ─────────────────────────────────────────────────────────────

/// Owns the active model and the data directory the presets load from.
///
/// This replaces the original implementation's process-global selection
/// state with an explicit session object: reselection takes `&mut self`,
/// so it cannot race a concurrent query.
#[derive(Debug)]
pub struct ModelStore {
    data_dir: PathBuf,
    current: Option<VelocityModel>,
}

impl ModelStore {
    /// Create a store reading preset tables from `data_dir`. No model is
    /// loaded until [`select`](Self::select) or a query.
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            current: None,
        }
    }

    /// Select and load a model by its ordinal flag 0–3.
    ///
    /// The flag is validated before anything is read, and the previous
    /// selection survives any load failure.
    pub fn select(&mut self, flag: i64) -> anyhow::Result<&VelocityModel> {
        let preset = ModelPreset::from_flag(flag)?;
        let model = VelocityModel::load_preset(&self.data_dir, preset)
            .with_context(|| format!("loading model {} ({})", flag, preset.label()))?;
        Ok(self.current.insert(model))
    }

    /// The active model, if one has been selected.
    pub fn current(&self) -> Option<&VelocityModel> {
        self.current.as_ref()
    }

    /// The active model, loading preset 0 with a notice when none has
    /// been selected yet.
    pub fn current_or_default(&mut self) -> anyhow::Result<&VelocityModel> {
        if self.current.is_none() {
            warn!("No model selected; loading default model 0 (2M++_SDSS)");
            return self.select(0);
        }
        Ok(self.current.as_ref().unwrap())
    }

    /// Estimate peculiar velocities against the active model, loading the
    /// default model first when none is selected.
    ///
    /// See [`VelocityModel::calculate_pv`] for the query semantics.
    pub fn calculate_pv(
        &mut self,
        ra_deg: f64,
        dec_deg: f64,
        z_cmb: &[f64],
        extrapolation: bool,
    ) -> anyhow::Result<Vec<f64>> {
        let model = self.current_or_default()?;
        if let Some(preset) = model.preset {
            info!("Using model {} ({})", preset.flag(), preset.label());
        }
        Ok(model.calculate_pv(ra_deg, dec_deg, z_cmb, extrapolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_through_presets() {
        for flag in 0..=3 {
            let preset = ModelPreset::from_flag(flag).unwrap();
            assert_eq!(preset.flag(), flag);
            assert!(!preset.label().is_empty());
            assert_ne!(preset.inside_filename(), preset.outside_filename());
        }
    }

    #[test]
    fn out_of_range_flags_are_rejected() {
        for flag in [-1, 4, 17, i64::MAX] {
            let err = ModelPreset::from_flag(flag).unwrap_err();
            assert_eq!(err, UnknownModelError(flag));
        }
    }

    #[test]
    fn invalid_selection_leaves_store_untouched() {
        let mut store = ModelStore::new("data");
        assert!(store.select(9).is_err());
        assert!(store.current().is_none());
    }

    #[test]
    fn from_parts_rejects_wrong_grid_size() {
        let boundary = BoundaryField::new(vec![0.0], vec![[0.0, 0.0, 0.0]]).unwrap();
        assert!(VelocityModel::from_parts(None, vec![0.0; 100], boundary).is_err());
    }
}
