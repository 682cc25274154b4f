//! Parsing for the dense grid velocity table.
//!
//! Each model ships a comma-delimited table with a header row and a
//! `vproj_2MPP` column holding one projected peculiar velocity per grid
//! cell, 129³ rows in total. Row order follows the flattened grid index
//! `x * 129² + y * 129 + z`. Cells inside the grid cube but outside the
//! survey volume hold NaN; empty or unparseable entries are read as NaN
//! rather than rejected.

use std::path::Path;

use anyhow::Context;

use crate::resolver::GRID_CELLS;

/// Header name of the projected-velocity column.
pub const VPROJ_COLUMN: &str = "vproj_2MPP";

/// Parse the grid velocity table from an in-memory CSV string.
pub fn parse_inside_table(data: &str) -> anyhow::Result<Vec<f64>> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let headers = rdr.headers()?.clone();
    let col = headers
        .iter()
        .position(|h| h.trim() == VPROJ_COLUMN)
        .with_context(|| format!("grid table has no '{}' column", VPROJ_COLUMN))?;

    let mut vproj = Vec::with_capacity(GRID_CELLS);
    for result in rdr.records() {
        let record = result?;
        let value: f64 = record
            .get(col)
            .unwrap_or("")
            .trim()
            .parse()
            .unwrap_or(f64::NAN);
        vproj.push(value);
    }
    Ok(vproj)
}

/// Load the grid velocity table from a file, checking the grid size.
pub fn load_inside_table_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<f64>> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading grid table {}", path.display()))?;
    let vproj = parse_inside_table(&data)?;
    anyhow::ensure!(
        vproj.len() == GRID_CELLS,
        "grid table {} has {} rows, expected {}",
        path.display(),
        vproj.len(),
        GRID_CELLS
    );
    Ok(vproj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vproj_column() {
        let data = "vproj_2MPP\n12.5\n-301.0\nnan\n7.0\n";
        let vproj = parse_inside_table(data).unwrap();
        assert_eq!(vproj.len(), 4);
        assert_eq!(vproj[0], 12.5);
        assert_eq!(vproj[1], -301.0);
        assert!(vproj[2].is_nan());
        assert_eq!(vproj[3], 7.0);
    }

    #[test]
    fn selects_named_column_among_several() {
        let data = "ix,vproj_2MPP,extra\n0,42.0,9\n1,-8.0,9\n2,,9\n";
        let vproj = parse_inside_table(data).unwrap();
        assert_eq!(vproj.len(), 3);
        assert_eq!(vproj[0], 42.0);
        assert_eq!(vproj[1], -8.0);
        assert!(vproj[2].is_nan());
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "velocity\n1.0\n";
        assert!(parse_inside_table(data).is_err());
    }

    #[test]
    #[ignore]
    fn load_distributed_model_table() {
        let vproj = load_inside_table_from_file("data/2MPP_SDSS.txt")
            .expect("Failed to read grid velocity table");
        assert_eq!(vproj.len(), GRID_CELLS);
    }
}
