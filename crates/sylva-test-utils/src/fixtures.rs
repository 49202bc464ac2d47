//! Deterministic fixtures.
//!
//! - [`attenuation_kernel`]: radially symmetric light multiplier in `(0, 1]`.
//! - [`reader_kernel`]: normalized disc used to read a footprint back.
//! - [`sample_library`]: a finalized two-species library with readers.
//! - [`scatter_trees`]: seeded tree positions and dimensions on a grid.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sylva_core::{IndexRect, SpeciesId};
use sylva_grid::GridGeometry;
use sylva_stamp::{InfluenceKernel, KernelLibrary, SizeClass};

/// A kernel of odd logical `width` whose values fall from `1 - strength`
/// at the center to 1 at the footprint edge. Cells beyond the footprint
/// are 1, so multiplying leaves them untouched.
pub fn attenuation_kernel(width: usize, strength: f32) -> InfluenceKernel {
    let offset = width / 2;
    let class = SizeClass::for_width(width);
    let n = class.internal_size();
    let radius = offset as f32 + 0.5;
    let mut values = vec![1.0f32; n * n];
    for y in 0..width {
        for x in 0..width {
            let dx = x as f32 - offset as f32;
            let dy = y as f32 - offset as f32;
            let d = (dx * dx + dy * dy).sqrt();
            if d < radius {
                values[y * n + x] = 1.0 - strength * (1.0 - d / radius);
            }
        }
    }
    InfluenceKernel::from_values(class, offset, values).expect("fixture kernel is well formed")
}

/// A disc of odd logical `width` whose values sum to 1.
pub fn reader_kernel(width: usize) -> InfluenceKernel {
    let offset = width / 2;
    let class = SizeClass::for_width(width);
    let n = class.internal_size();
    let radius = offset as f32 + 0.5;
    let mut values = vec![0.0f32; n * n];
    let mut inside = 0usize;
    for y in 0..width {
        for x in 0..width {
            let dx = x as f32 - offset as f32;
            let dy = y as f32 - offset as f32;
            if (dx * dx + dy * dy).sqrt() < radius {
                values[y * n + x] = 1.0;
                inside += 1;
            }
        }
    }
    for v in &mut values {
        *v /= inside as f32;
    }
    InfluenceKernel::from_values(class, offset, values).expect("fixture kernel is well formed")
}

/// Species used by [`sample_library`].
pub const SPRUCE: SpeciesId = SpeciesId(0);
/// Species used by [`sample_library`].
pub const BEECH: SpeciesId = SpeciesId(1);

/// A finalized library: two species with kernels from 3 to 15 cells
/// wide at several dbh/hd classes, plus readers for crowns from 1 m to
/// 4 m, all linked.
pub fn sample_library() -> KernelLibrary {
    let mut lib = KernelLibrary::default();
    let sizes = [
        (5.0, 3, 1.0),
        (12.0, 5, 1.5),
        (25.0, 9, 2.5),
        (45.0, 13, 3.5),
        (80.0, 15, 4.0),
    ];
    for (species, strength) in [(SPRUCE, 0.6), (BEECH, 0.8)] {
        for &(dbh, width, crown) in &sizes {
            for hd in [50.0, 90.0] {
                lib.add_kernel(species, attenuation_kernel(width, strength), dbh, hd, crown)
                    .expect("fixture classes are in range");
            }
        }
    }
    for &(_, width, crown) in &sizes {
        lib.add_reader(reader_kernel(width.min(7)), crown)
            .expect("fixture reader radii are in range");
    }
    lib.finalize().expect("fixture library finalizes");
    lib.attach_readers();
    lib
}

/// A tree placed on a light grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatteredTree {
    pub cell: (i32, i32),
    pub species: SpeciesId,
    pub dbh: f32,
    pub height: f32,
}

/// `count` trees at random cells inside `window`, reproducible from
/// `seed`.
pub fn scatter_trees(
    seed: u64,
    geometry: &GridGeometry,
    window: IndexRect,
    count: usize,
) -> Vec<ScatteredTree> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let window = clip(window, geometry);
    (0..count)
        .map(|_| {
            let x = rng.gen_range(window.x..window.end_x());
            let y = rng.gen_range(window.y..window.end_y());
            let dbh: f32 = rng.gen_range(5.0..60.0);
            let hd: f32 = rng.gen_range(55.0..110.0);
            ScatteredTree {
                cell: (x, y),
                species: if rng.gen_bool(0.5) { SPRUCE } else { BEECH },
                dbh,
                height: dbh * hd / 100.0,
            }
        })
        .collect()
}

fn clip(window: IndexRect, geometry: &GridGeometry) -> IndexRect {
    let x0 = window.x.max(0);
    let y0 = window.y.max(0);
    let x1 = window.end_x().min(geometry.size_x() as i32);
    let y1 = window.end_y().min(geometry.size_y() as i32);
    assert!(x1 > x0 && y1 > y0, "scatter window {window} misses the grid");
    IndexRect::new(x0, y0, x1 - x0, y1 - y0)
}

/// South-west cells of a `cols x rows` layout of square units
/// `unit_cells` wide, in row-major order.
pub fn unit_origins(cols: i32, rows: i32, unit_cells: i32) -> Vec<(i32, i32)> {
    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (c * unit_cells, r * unit_cells)))
        .collect()
}
