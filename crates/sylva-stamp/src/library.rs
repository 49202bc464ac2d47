//! Kernel libraries: per-species lookup tables over an owning arena.
//!
//! Kernels are stored once in the library's arena and referred to by
//! [`KernelId`]. Each species owns a lookup table indexed by diameter
//! class and height/diameter class; reader kernels live in a separate
//! table keyed by crown radius. Full-resolution kernels point at their
//! reader by id.
//!
//! ```text
//! dbh class:  0..=5   1 cm bins from 4 cm
//!             6..=10  2 cm bins from 10 cm
//!             11..    4 cm bins from 20 cm     (70 classes)
//! hd class:   (hd - 35) / 10                   (16 classes)
//! reader key: (floor(r), tenths of r)
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use sylva_core::{KernelId, SpeciesId};
use sylva_grid::{Grid, GridGeometry};
use tracing::{debug, info};

use crate::distance::DistanceTable;
use crate::error::KernelError;
use crate::kernel::InfluenceKernel;

/// Number of diameter classes.
pub const DBH_CLASS_COUNT: usize = 70;
/// Number of height/diameter classes.
pub const HD_CLASS_COUNT: usize = 16;
/// Lower bound of height/diameter class 0.
pub const HD_CLASS_LOW: f32 = 35.0;
/// Width of one height/diameter class.
pub const HD_CLASS_WIDTH: f32 = 10.0;
/// Light grid cell size used for distance tables by default.
pub const DEFAULT_CELL_SIZE: f64 = 2.0;

/// Diameter class of `dbh` (cm). May exceed the table.
pub fn dbh_class(dbh: f32) -> i32 {
    if dbh < 10.0 {
        ((dbh - 4.0) as i32).max(0)
    } else if dbh < 20.0 {
        6 + ((dbh - 10.0) / 2.0) as i32
    } else {
        11 + ((dbh - 20.0) / 4.0) as i32
    }
}

/// Height/diameter class of ratio `hd`. May fall outside the table.
pub fn hd_class(hd: f32) -> i32 {
    ((hd - HD_CLASS_LOW) / HD_CLASS_WIDTH) as i32
}

/// Lookup cell of a reader kernel with crown radius `radius` (m).
pub fn reader_key(radius: f32) -> (i32, i32) {
    let tenths = (((radius % 1.0) as f64 + 0.0001) * 10.0) as i32;
    (radius as i32, tenths.min(HD_CLASS_COUNT as i32 - 1))
}

fn in_table(class_dbh: i32, class_hd: i32) -> bool {
    (0..DBH_CLASS_COUNT as i32).contains(&class_dbh) && (0..HD_CLASS_COUNT as i32).contains(&class_hd)
}

fn empty_table() -> Grid<Option<KernelId>> {
    let geometry = GridGeometry::new(1.0, DBH_CLASS_COUNT, HD_CLASS_COUNT)
        .expect("class table dimensions are non-zero");
    Grid::new_with(geometry, None)
}

/// One registered kernel with the dimensions it was registered for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelEntry {
    /// Arena id of the kernel.
    pub id: KernelId,
    /// Diameter at breast height (cm); zero for readers.
    pub dbh: f32,
    /// Height/diameter ratio; zero for readers.
    pub hd: f32,
    /// Crown radius (m).
    pub crown_radius: f32,
}

/// The class table of one species (or of the reader set).
#[derive(Clone, Debug)]
pub struct SpeciesKernels {
    lookup: Grid<Option<KernelId>>,
    entries: Vec<KernelEntry>,
}

impl Default for SpeciesKernels {
    fn default() -> Self {
        Self {
            lookup: empty_table(),
            entries: Vec::new(),
        }
    }
}

impl SpeciesKernels {
    /// Registered kernels in insertion order.
    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Kernel stored at a class cell, if any.
    pub fn at_class(&self, class_dbh: i32, class_hd: i32) -> Option<KernelId> {
        self.lookup.get(class_dbh, class_hd).copied().flatten()
    }

    fn insert(&mut self, class_dbh: i32, class_hd: i32, entry: KernelEntry) -> Result<(), KernelError> {
        if !in_table(class_dbh, class_hd) {
            return Err(KernelError::StampOutOfRange {
                dbh: entry.dbh,
                hd: entry.hd,
            });
        }
        self.lookup[(class_dbh, class_hd)] = Some(entry.id);
        self.entries.push(entry);
        Ok(())
    }

    /// Kernel for a tree, falling back to the nearest edge class when
    /// the dimensions fall outside the table.
    pub fn lookup(&self, dbh: f32, height: f32) -> Option<KernelId> {
        let hd = 100.0 * height / dbh;
        let (d, h) = (dbh_class(dbh), hd_class(hd));
        let last_d = DBH_CLASS_COUNT as i32 - 1;
        let last_h = HD_CLASS_COUNT as i32 - 1;
        let d_in = (0..=last_d).contains(&d);
        let h_in = (0..=last_h).contains(&h);

        if d_in && h_in {
            if let Some(id) = self.at_class(d, h) {
                return Some(id);
            }
        }
        if d_in {
            return self.at_class(d, if h > last_h { last_h } else { 0 });
        }
        if h_in {
            return self.at_class(if d > last_d { last_d } else { 0 }, h);
        }
        if d > last_d {
            return self.at_class(last_d, if h < 0 { 0 } else { last_h });
        }
        None
    }

    /// Fill empty class cells so every lookup inside the table hits a
    /// kernel. Returns the number of cells filled.
    ///
    /// Within a diameter class, cells left of the first kernel take that
    /// kernel and cells right of the last take the last. Diameter classes
    /// without kernels copy the previous class; leading empty classes
    /// copy the first populated one.
    fn fill_gaps(&mut self) -> usize {
        let before = self.lookup.iter().filter(|c| c.is_none()).count();
        let hd_count = HD_CLASS_COUNT as i32;
        let mut first_populated = None;
        for d in 0..DBH_CLASS_COUNT as i32 {
            let row: Vec<Option<KernelId>> = (0..hd_count).map(|h| self.at_class(d, h)).collect();
            let Some(first) = row.iter().position(Option::is_some) else {
                if d > 0 {
                    for h in 0..hd_count {
                        self.lookup[(d, h)] = self.lookup[(d - 1, h)];
                    }
                }
                continue;
            };
            first_populated.get_or_insert(d);
            let mut current = row[first];
            for (h, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    current = *cell;
                }
                self.lookup[(d, h as i32)] = if h < first { row[first] } else { current };
            }
        }
        if let Some(first) = first_populated {
            for d in 0..first {
                for h in 0..hd_count {
                    self.lookup[(d, h)] = self.lookup[(first, h)];
                }
            }
        }
        let after = self.lookup.iter().filter(|c| c.is_none()).count();
        before - after
    }
}

/// An owning collection of kernels with species and reader tables.
#[derive(Clone, Debug)]
pub struct KernelLibrary {
    kernels: Vec<InfluenceKernel>,
    species: IndexMap<SpeciesId, SpeciesKernels>,
    readers: SpeciesKernels,
    distances: Option<Arc<DistanceTable>>,
    cell_size: f64,
}

impl Default for KernelLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl KernelLibrary {
    /// An empty library whose distance table will use `cell_size`.
    pub fn new(cell_size: f64) -> Self {
        Self {
            kernels: Vec::new(),
            species: IndexMap::new(),
            readers: SpeciesKernels::default(),
            distances: None,
            cell_size,
        }
    }

    /// Number of kernels (species and readers) in the arena.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// `true` if no kernel has been added.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    fn push(&mut self, kernel: InfluenceKernel) -> KernelId {
        let id = KernelId(self.kernels.len() as u32);
        self.kernels.push(kernel);
        id
    }

    /// Register a full-resolution kernel for `species` at the given tree
    /// dimensions.
    ///
    /// Call [`finalize`](Self::finalize) after the last kernel is added.
    pub fn add_kernel(
        &mut self,
        species: SpeciesId,
        mut kernel: InfluenceKernel,
        dbh: f32,
        hd: f32,
        crown_radius: f32,
    ) -> Result<KernelId, KernelError> {
        let (d, h) = (dbh_class(dbh), hd_class(hd));
        if !in_table(d, h) {
            return Err(KernelError::StampOutOfRange { dbh, hd });
        }
        kernel.set_crown_radius(crown_radius);
        let id = self.push(kernel);
        let entry = KernelEntry {
            id,
            dbh,
            hd,
            crown_radius,
        };
        self.species.entry(species).or_default().insert(d, h, entry)?;
        Ok(id)
    }

    /// Register a reader kernel for crowns of `crown_radius` metres.
    pub fn add_reader(
        &mut self,
        mut kernel: InfluenceKernel,
        crown_radius: f32,
    ) -> Result<KernelId, KernelError> {
        let (d, h) = reader_key(crown_radius);
        if !in_table(d, h) {
            return Err(KernelError::StampOutOfRange {
                dbh: 0.0,
                hd: crown_radius,
            });
        }
        kernel.set_crown_radius(crown_radius);
        let id = self.push(kernel);
        let entry = KernelEntry {
            id,
            dbh: 0.0,
            hd: 0.0,
            crown_radius,
        };
        self.readers.insert(d, h, entry)?;
        Ok(id)
    }

    /// Fill lookup gaps and share a distance table covering the largest
    /// kernel with every kernel in the arena.
    pub fn finalize(&mut self) -> Result<(), KernelError> {
        let mut filled = 0;
        for table in self.species.values_mut() {
            filled += table.fill_gaps();
        }
        filled += self.readers.fill_gaps();

        let max_size = self
            .kernels
            .iter()
            .map(InfluenceKernel::internal_size)
            .max()
            .unwrap_or(0);
        let needs_table = self.distances.as_ref().map_or(true, |t| t.size() < max_size);
        if needs_table && max_size > 0 {
            self.distances = Some(Arc::new(DistanceTable::new(max_size, self.cell_size)?));
        }
        if let Some(table) = &self.distances {
            for kernel in &mut self.kernels {
                kernel.attach_distances(Arc::clone(table))?;
            }
        }
        debug!(
            kernels = self.kernels.len(),
            species = self.species.len(),
            max_size,
            filled,
            "kernel library finalized"
        );
        Ok(())
    }

    /// Link every species kernel to the reader matching its crown radius.
    ///
    /// Linked kernels adopt the reader's crown radius. Returns the number
    /// of kernels that found a reader.
    pub fn attach_readers(&mut self) -> usize {
        let mut found = 0;
        let mut total = 0;
        for table in self.species.values() {
            for entry in &table.entries {
                total += 1;
                let Some(reader) = self.reader_for(entry.crown_radius) else {
                    continue;
                };
                let radius = self.kernels[reader.index()].crown_radius();
                self.kernels[entry.id.index()].set_reader(reader, radius);
                found += 1;
            }
        }
        info!(found, total, "attached reader kernels");
        found
    }

    /// Replace every value `v` of the species' kernels by `1 - v`.
    pub fn invert_species(&mut self, species: SpeciesId) {
        if let Some(table) = self.species.get(&species) {
            for entry in &table.entries {
                self.kernels[entry.id.index()].invert();
            }
        }
    }

    /// Replace every value `v` of the reader kernels by `1 - v`.
    pub fn invert_readers(&mut self) {
        for entry in &self.readers.entries {
            self.kernels[entry.id.index()].invert();
        }
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// The kernel behind `id`.
    pub fn kernel(&self, id: KernelId) -> Result<&InfluenceKernel, KernelError> {
        self.kernels
            .get(id.index())
            .ok_or(KernelError::UnknownKernel { id })
    }

    /// Id of the kernel for a tree of `species` with `dbh` (cm) and
    /// `height` (m).
    pub fn lookup(&self, species: SpeciesId, dbh: f32, height: f32) -> Result<KernelId, KernelError> {
        self.species
            .get(&species)
            .and_then(|t| t.lookup(dbh, height))
            .ok_or(KernelError::NoKernelFor {
                species,
                dbh,
                height,
            })
    }

    /// The kernel for a tree; see [`lookup`](Self::lookup).
    pub fn kernel_for(
        &self,
        species: SpeciesId,
        dbh: f32,
        height: f32,
    ) -> Result<&InfluenceKernel, KernelError> {
        let id = self.lookup(species, dbh, height)?;
        self.kernel(id)
    }

    /// Reader kernel for crowns of `crown_radius` metres.
    pub fn reader_for(&self, crown_radius: f32) -> Option<KernelId> {
        let (d, h) = reader_key(crown_radius);
        self.readers.at_class(d, h)
    }

    /// The reader linked to kernel `id`, if any.
    pub fn reader_of(&self, id: KernelId) -> Result<Option<&InfluenceKernel>, KernelError> {
        match self.kernel(id)?.reader() {
            Some(reader) => self.kernel(reader).map(Some),
            None => Ok(None),
        }
    }

    /// The class table of `species`.
    pub fn species(&self, species: SpeciesId) -> Option<&SpeciesKernels> {
        self.species.get(&species)
    }

    /// Species with at least one kernel, in registration order.
    pub fn species_ids(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.species.keys().copied()
    }

    /// The shared distance table, once finalized.
    pub fn distance_table(&self) -> Option<&Arc<DistanceTable>> {
        self.distances.as_ref()
    }

    /// Largest internal kernel size in the library.
    pub fn max_internal_size(&self) -> usize {
        self.kernels
            .iter()
            .map(InfluenceKernel::internal_size)
            .max()
            .unwrap_or(0)
    }
}
