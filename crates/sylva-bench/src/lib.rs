//! Benchmark profiles for the Sylva spatial substrate.
//!
//! - [`reference_profile`]: 5x5 units of 50 cells (250x250 light grid)
//!   with 40 trees per unit
//! - [`stress_profile`]: 10x10 units of 50 cells with 120 trees per unit
//! - [`light_units`]: seeded unit layout for any size

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use sylva_core::{IndexRect, UnitId};
use sylva_engine::LightUnit;
use sylva_grid::GridGeometry;
use sylva_stamp::KernelLibrary;
use sylva_test_utils::{sample_library, scatter_trees, unit_origins};

/// Light-grid cells along one side of a resource unit (100 m at 2 m).
pub const UNIT_CELLS: i32 = 50;

/// Everything a light pass needs.
#[derive(Clone, Debug)]
pub struct ForestProfile {
    /// Kernels for the scattered species.
    pub library: KernelLibrary,
    /// Light grid shape.
    pub geometry: GridGeometry,
    /// Units with planted trees.
    pub units: Vec<LightUnit>,
}

/// 5x5 units, 40 trees each.
pub fn reference_profile(seed: u64) -> ForestProfile {
    profile(seed, 5, 40)
}

/// 10x10 units, 120 trees each.
pub fn stress_profile(seed: u64) -> ForestProfile {
    profile(seed, 10, 120)
}

fn profile(seed: u64, side: i32, trees_per_unit: usize) -> ForestProfile {
    let library = sample_library();
    let cells = (side * UNIT_CELLS) as usize;
    let geometry = GridGeometry::new(2.0, cells, cells).expect("profile grid is non-empty");
    let units = light_units(&library, &geometry, side, trees_per_unit, seed);
    ForestProfile {
        library,
        geometry,
        units,
    }
}

/// A `side x side` layout of [`UNIT_CELLS`]-wide units, each with
/// `trees_per_unit` trees scattered from `seed`.
pub fn light_units(
    library: &KernelLibrary,
    geometry: &GridGeometry,
    side: i32,
    trees_per_unit: usize,
    seed: u64,
) -> Vec<LightUnit> {
    unit_origins(side, side, UNIT_CELLS)
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let window = IndexRect::new(x, y, UNIT_CELLS, UNIT_CELLS);
            let mut unit =
                LightUnit::new(UnitId(i as u32), window).at(x / UNIT_CELLS, y / UNIT_CELLS);
            for tree in scatter_trees(seed.wrapping_add(i as u64), geometry, window, trees_per_unit)
            {
                unit.plant(library, tree.species, tree.cell, tree.dbh, tree.height)
                    .expect("sample library covers scattered trees");
            }
            unit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_shape() {
        let p = reference_profile(1);
        assert_eq!(p.geometry.count(), 250 * 250);
        assert_eq!(p.units.len(), 25);
        assert!(p.units.iter().all(|u| u.trees.len() == 40));
        assert_eq!(p.units[6].position, Some((1, 1)));
    }
}
