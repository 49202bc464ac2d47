//! Projecting a kernel onto a grid.
//!
//! A kernel anchored at grid cell `(ax, ay)` with offset `o` maps kernel
//! cell `(kx, ky)` to target cell `(ax + kx - o, ay + ky - o)`. The
//! [`EdgePolicy`] decides what happens to targets outside the grid.
//! Target coordinates are resolved once per axis, so a [`Footprint`]
//! never yields the same target cell twice.

use smallvec::SmallVec;
use sylva_core::{GridError, IndexRect};
use sylva_grid::{Grid, GridGeometry};

use crate::error::KernelError;
use crate::kernel::InfluenceKernel;

/// How target cells outside the grid are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Targets outside the grid are skipped.
    #[default]
    Clip,
    /// Targets wrap modulo the grid size on both axes.
    Torus,
    /// Targets wrap inside the given window (e.g. one resource unit).
    TorusWithin(IndexRect),
}

impl EdgePolicy {
    /// `Torus` when `torus` is set, otherwise `Clip`.
    pub fn from_torus(torus: bool) -> Self {
        if torus {
            Self::Torus
        } else {
            Self::Clip
        }
    }
}

/// One kernel cell paired with the grid cell it lands on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootprintCell {
    /// Kernel column.
    pub kx: usize,
    /// Kernel row.
    pub ky: usize,
    /// Linear index into the kernel's values.
    pub kernel_index: usize,
    /// Target column on the grid.
    pub tx: i32,
    /// Target row on the grid.
    pub ty: i32,
    /// Linear index into the grid.
    pub target_index: usize,
    /// Kernel value at `(kx, ky)`.
    pub value: f32,
}

type Axis = SmallVec<[Option<i32>; 64]>;

#[derive(Clone, Copy)]
enum AxisRule {
    Clip { len: i32 },
    Wrap { start: i32, len: i32 },
}

fn resolve_axis(anchor: i32, offset: i32, n: usize, rule: AxisRule) -> Axis {
    (0..n as i32)
        .map(|k| {
            let v = anchor + k - offset;
            match rule {
                AxisRule::Clip { len } => (0..len).contains(&v).then_some(v),
                AxisRule::Wrap { start, len } => Some(start + (v - start).rem_euclid(len)),
            }
        })
        .collect()
}

/// Iterator over the grid cells covered by one kernel application.
///
/// Cells are produced in kernel row-major order. Every kernel cell
/// (including those beyond the logical footprint) is considered, so a
/// fully inside or wrapped application yields `internal_size²` cells.
#[derive(Clone, Debug)]
pub struct Footprint<'k> {
    values: &'k [f32],
    internal_size: usize,
    size_x: usize,
    xs: Axis,
    ys: Axis,
    kx: usize,
    ky: usize,
}

impl<'k> Footprint<'k> {
    /// Footprint of `kernel` anchored at `anchor` on a grid shaped like
    /// `geometry`.
    ///
    /// Torus policies require a wrap extent at least as large as the
    /// kernel on both axes; a `TorusWithin` window must lie inside the
    /// grid.
    pub fn new(
        kernel: &'k InfluenceKernel,
        geometry: &GridGeometry,
        anchor: (i32, i32),
        policy: EdgePolicy,
    ) -> Result<Self, KernelError> {
        let n = kernel.internal_size();
        let grid_rect = geometry.index_rect();
        let (rule_x, rule_y) = match policy {
            EdgePolicy::Clip => (
                AxisRule::Clip {
                    len: grid_rect.width,
                },
                AxisRule::Clip {
                    len: grid_rect.height,
                },
            ),
            EdgePolicy::Torus => wrap_rules(grid_rect, n)?,
            EdgePolicy::TorusWithin(window) => {
                let inside = !window.is_empty()
                    && geometry.is_index_valid(window.x, window.y)
                    && geometry.is_index_valid(window.end_x() - 1, window.end_y() - 1);
                if !inside {
                    return Err(GridError::WindowOutOfBounds {
                        window: window.to_string(),
                        bounds: grid_rect.to_string(),
                    }
                    .into());
                }
                wrap_rules(window, n)?
            }
        };
        let offset = kernel.offset() as i32;
        Ok(Self {
            values: kernel.values(),
            internal_size: n,
            size_x: geometry.size_x(),
            xs: resolve_axis(anchor.0, offset, n, rule_x),
            ys: resolve_axis(anchor.1, offset, n, rule_y),
            kx: 0,
            ky: 0,
        })
    }

    /// Number of cells the footprint covers on the grid.
    pub fn visible_count(&self) -> usize {
        let cols = self.xs.iter().flatten().count();
        let rows = self.ys.iter().flatten().count();
        cols * rows
    }

    /// Covered target columns, in kernel order.
    pub fn columns(&self) -> impl Iterator<Item = i32> + '_ {
        self.xs.iter().flatten().copied()
    }

    /// Covered target rows, in kernel order.
    pub fn rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.ys.iter().flatten().copied()
    }
}

fn wrap_rules(extent: IndexRect, n: usize) -> Result<(AxisRule, AxisRule), KernelError> {
    if (extent.width as usize) < n || (extent.height as usize) < n {
        return Err(KernelError::TorusTooSmall {
            width: extent.width,
            height: extent.height,
            internal_size: n,
        });
    }
    Ok((
        AxisRule::Wrap {
            start: extent.x,
            len: extent.width,
        },
        AxisRule::Wrap {
            start: extent.y,
            len: extent.height,
        },
    ))
}

impl Iterator for Footprint<'_> {
    type Item = FootprintCell;

    fn next(&mut self) -> Option<FootprintCell> {
        while self.ky < self.internal_size {
            let (kx, ky) = (self.kx, self.ky);
            self.kx += 1;
            if self.kx == self.internal_size {
                self.kx = 0;
                self.ky += 1;
            }
            let (Some(ty), Some(tx)) = (self.ys[ky], self.xs[kx]) else {
                continue;
            };
            let kernel_index = ky * self.internal_size + kx;
            return Some(FootprintCell {
                kx,
                ky,
                kernel_index,
                tx,
                ty,
                target_index: ty as usize * self.size_x + tx as usize,
                value: self.values[kernel_index],
            });
        }
        None
    }
}

// ── Accumulation ────────────────────────────────────────────────

/// Apply `kernel` at `anchor` onto `grid`, replacing each covered cell
/// with `combine(current, cell)`.
///
/// `combine` runs exactly once per covered cell. Returns the number of
/// cells written.
pub fn accumulate<F>(
    grid: &mut Grid<f32>,
    kernel: &InfluenceKernel,
    anchor: (i32, i32),
    policy: EdgePolicy,
    mut combine: F,
) -> Result<usize, KernelError>
where
    F: FnMut(f32, &FootprintCell) -> f32,
{
    let footprint = Footprint::new(kernel, grid.geometry(), anchor, policy)?;
    let mut written = 0;
    for cell in footprint {
        let slot = &mut grid[cell.target_index];
        *slot = combine(*slot, &cell);
        written += 1;
    }
    Ok(written)
}

/// Weighted sum of `grid` under `kernel` at `anchor`
/// (`Σ grid[target] * value`), as used by reader kernels.
pub fn sample(
    grid: &Grid<f32>,
    kernel: &InfluenceKernel,
    anchor: (i32, i32),
    policy: EdgePolicy,
) -> Result<f64, KernelError> {
    let footprint = Footprint::new(kernel, grid.geometry(), anchor, policy)?;
    Ok(footprint
        .map(|c| grid[c.target_index] as f64 * c.value as f64)
        .sum())
}

/// Combine operators for [`accumulate`].
pub mod combine {
    use super::FootprintCell;

    /// Multiply the current value by the kernel value.
    pub fn multiply(current: f32, cell: &FootprintCell) -> f32 {
        current * cell.value
    }

    /// Add the kernel value to the current value.
    pub fn add(current: f32, cell: &FootprintCell) -> f32 {
        current + cell.value
    }
}
