//! Stamping tree kernels onto the light grid, unit by unit.

use sylva_core::{IndexRect, KernelId, SpeciesId, UnitId};
use sylva_stamp::{EdgePolicy, FootprintCell, KernelError, KernelLibrary};
use tracing::debug;

use crate::error::ScheduleError;
use crate::partition::SpatialUnit;
use crate::scheduler::{PartitionedScheduler, RunReport};
use crate::shared::SharedGrid;

/// One tree's kernel placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeInfluence {
    /// Light-grid cell the kernel is anchored on.
    pub cell: (i32, i32),
    /// Kernel selected for the tree.
    pub kernel: KernelId,
    /// Light read back through the kernel's reader, once
    /// [`LightPass::read_back`] has run.
    pub reading: Option<f64>,
}

/// A resource unit: a window of the light grid and the trees standing
/// in it.
#[derive(Clone, Debug, PartialEq)]
pub struct LightUnit {
    /// Unit id.
    pub id: UnitId,
    /// Column and row in the unit layout, if known.
    pub position: Option<(i32, i32)>,
    /// Light-grid cells owned by the unit.
    pub window: IndexRect,
    /// Trees to stamp.
    pub trees: Vec<TreeInfluence>,
}

impl LightUnit {
    /// An empty unit owning `window`.
    pub fn new(id: UnitId, window: IndexRect) -> Self {
        Self {
            id,
            position: None,
            window,
            trees: Vec::new(),
        }
    }

    /// Set the unit's layout position.
    pub fn at(mut self, column: i32, row: i32) -> Self {
        self.position = Some((column, row));
        self
    }

    /// Add a tree of `species` with `dbh` (cm) and `height` (m) at
    /// `cell`, resolving its kernel in `library`.
    pub fn plant(
        &mut self,
        library: &KernelLibrary,
        species: SpeciesId,
        cell: (i32, i32),
        dbh: f32,
        height: f32,
    ) -> Result<KernelId, KernelError> {
        let kernel = library.lookup(species, dbh, height)?;
        self.trees.push(TreeInfluence {
            cell,
            kernel,
            reading: None,
        });
        Ok(kernel)
    }
}

impl SpatialUnit for LightUnit {
    fn grid_position(&self) -> Option<(i32, i32)> {
        self.position
    }
}

/// Edge handling for a light pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightEdge {
    /// Drop influence that falls off the grid.
    #[default]
    Clip,
    /// Wrap over the whole grid.
    Torus,
    /// Wrap inside each unit's own window.
    UnitTorus,
}

impl LightEdge {
    fn policy(self, window: IndexRect) -> EdgePolicy {
        match self {
            LightEdge::Clip => EdgePolicy::Clip,
            LightEdge::Torus => EdgePolicy::Torus,
            LightEdge::UnitTorus => EdgePolicy::TorusWithin(window),
        }
    }
}

/// Drives kernel accumulation and read-back over a unit collection.
#[derive(Clone, Copy, Debug)]
pub struct LightPass<'a> {
    library: &'a KernelLibrary,
    edge: LightEdge,
}

impl<'a> LightPass<'a> {
    /// A pass over kernels from `library`.
    pub fn new(library: &'a KernelLibrary, edge: LightEdge) -> Self {
        Self { library, edge }
    }

    /// Edge handling in use.
    pub fn edge(&self) -> LightEdge {
        self.edge
    }

    /// Stamp every tree of every unit onto `grid` with `combine`.
    ///
    /// The scheduler must have been configured for `units`. A missing
    /// kernel or an invalid edge setup faults the unit's task.
    pub fn stamp<F>(
        &self,
        scheduler: &PartitionedScheduler,
        units: &mut [LightUnit],
        grid: &SharedGrid,
        combine: F,
    ) -> Result<RunReport, ScheduleError>
    where
        F: Fn(f32, &FootprintCell) -> f32 + Sync,
    {
        let report =
            scheduler.try_run_over_units(units, |unit| self.stamp_unit(unit, grid, &combine).map(drop))?;
        debug!(units = units.len(), mode = ?report.mode, "light stamped");
        Ok(report)
    }

    /// Stamp one unit's trees; returns the number of cells written.
    pub fn stamp_unit<F>(
        &self,
        unit: &LightUnit,
        grid: &SharedGrid,
        combine: &F,
    ) -> Result<usize, KernelError>
    where
        F: Fn(f32, &FootprintCell) -> f32,
    {
        let policy = self.edge.policy(unit.window);
        let mut written = 0;
        for tree in &unit.trees {
            let kernel = self.library.kernel(tree.kernel)?;
            written += grid.accumulate(kernel, tree.cell, policy, combine)?;
        }
        Ok(written)
    }

    /// Sample `grid` under each tree's reader kernel and store the result
    /// in [`TreeInfluence::reading`]. Trees whose kernel has no reader
    /// get `None`.
    pub fn read_back(
        &self,
        scheduler: &PartitionedScheduler,
        units: &mut [LightUnit],
        grid: &SharedGrid,
    ) -> Result<RunReport, ScheduleError> {
        scheduler.try_run_over_units(units, |unit| self.read_unit(unit, grid))
    }

    fn read_unit(&self, unit: &mut LightUnit, grid: &SharedGrid) -> Result<(), KernelError> {
        let policy = self.edge.policy(unit.window);
        for tree in &mut unit.trees {
            tree.reading = match self.library.reader_of(tree.kernel)? {
                Some(reader) => Some(grid.sample(reader, tree.cell, policy)?),
                None => None,
            };
        }
        Ok(())
    }
}
