//! A single precomputed influence kernel ("stamp").

use std::f32::consts::PI;
use std::sync::Arc;

use sylva_core::{GridError, KernelId};
use sylva_grid::Grid;
use tracing::warn;

use crate::distance::DistanceTable;
use crate::error::KernelError;
use crate::size::{SizeClass, MAX_LOGICAL_WIDTH};

/// A square array of attenuation values describing one tree's
/// footprint.
///
/// The logical footprint is `2 * offset + 1` cells wide and starts at
/// internal cell `(0, 0)`; the tree sits at `(offset, offset)`. Values
/// beyond the logical footprint are stored but normally zero.
#[derive(Clone, Debug)]
pub struct InfluenceKernel {
    size_class: SizeClass,
    offset: usize,
    values: Vec<f32>,
    crown_radius: f32,
    crown_area: f32,
    reader: Option<KernelId>,
    distances: Option<Arc<DistanceTable>>,
}

impl PartialEq for InfluenceKernel {
    fn eq(&self, other: &Self) -> bool {
        self.size_class == other.size_class
            && self.offset == other.offset
            && self.values == other.values
            && self.crown_radius == other.crown_radius
            && self.reader == other.reader
    }
}

impl InfluenceKernel {
    /// An all-zero kernel of the given class with offset 0.
    pub fn new(size_class: SizeClass) -> Self {
        Self {
            size_class,
            offset: 0,
            values: vec![0.0; size_class.cell_count()],
            crown_radius: 0.0,
            crown_area: 0.0,
            reader: None,
            distances: None,
        }
    }

    /// An all-zero kernel sized for a logical footprint `width` cells wide.
    ///
    /// `width` must be odd. Widths above 63 are clipped to 63 with a
    /// warning.
    pub fn for_width(width: usize) -> Result<Self, KernelError> {
        if width % 2 == 0 {
            return Err(KernelError::EvenWidth {
                width,
                grid_size: None,
            });
        }
        let width = clip_width(width);
        let mut kernel = Self::new(SizeClass::for_width(width));
        kernel.offset = width / 2;
        Ok(kernel)
    }

    /// A kernel from raw row-major values.
    pub fn from_values(
        size_class: SizeClass,
        offset: usize,
        values: Vec<f32>,
    ) -> Result<Self, KernelError> {
        if values.len() != size_class.cell_count() {
            return Err(KernelError::ValueCountMismatch {
                expected: size_class.cell_count(),
                found: values.len(),
            });
        }
        check_offset(size_class, offset)?;
        Ok(Self {
            values,
            offset,
            ..Self::new(size_class)
        })
    }

    /// Extract a centered `width x width` window from a dense source
    /// grid.
    ///
    /// The source grid side and `width` must both be odd. Widths above
    /// 63 are clipped to 63 with a warning, keeping the window centered.
    pub fn from_source_grid(source: &Grid<f32>, width: usize) -> Result<Self, KernelError> {
        let side = source.size_x();
        if side % 2 == 0 || width % 2 == 0 {
            return Err(KernelError::EvenWidth {
                width,
                grid_size: Some(side),
            });
        }
        let mut kernel = Self::new(SizeClass::for_width(width));
        let width = clip_width(width);
        kernel.offset = width / 2;
        let corner = (side / 2) as i32 - (width / 2) as i32;
        for y in 0..width {
            for x in 0..width {
                let (sx, sy) = (corner + x as i32, corner + y as i32);
                let value = source.get(sx, sy).copied().ok_or_else(|| {
                    GridError::WindowOutOfBounds {
                        window: format!("{width}x{width} centered window"),
                        bounds: source.geometry().index_rect().to_string(),
                    }
                })?;
                kernel.set_value(x, y, value);
            }
        }
        Ok(kernel)
    }

    /// The storage size class.
    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    /// Side length of the internal array.
    pub fn internal_size(&self) -> usize {
        self.size_class.internal_size()
    }

    /// Distance from the internal array's edge to the tree cell.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Width of the logical footprint (`2 * offset + 1`).
    pub fn logical_size(&self) -> usize {
        self.offset * 2 + 1
    }

    /// Change the center offset.
    pub fn set_offset(&mut self, offset: usize) -> Result<(), KernelError> {
        check_offset(self.size_class, offset)?;
        self.offset = offset;
        Ok(())
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at internal cell `(x, y)`. Panics outside the array.
    #[inline]
    pub fn value(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.internal_size() + x]
    }

    /// Value at offset `(dx, dy)` from the tree cell.
    pub fn value_from_center(&self, dx: i32, dy: i32) -> Option<f32> {
        let x = self.offset as i32 + dx;
        let y = self.offset as i32 + dy;
        let n = self.internal_size() as i32;
        if (0..n).contains(&x) && (0..n).contains(&y) {
            Some(self.value(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Overwrite internal cell `(x, y)`. Panics outside the array.
    pub fn set_value(&mut self, x: usize, y: usize, value: f32) {
        let n = self.internal_size();
        self.values[y * n + x] = value;
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().map(|&v| v as f64).sum()
    }

    /// Replace every value `v` by `1 - v`.
    pub fn invert(&mut self) {
        for v in &mut self.values {
            *v = 1.0 - *v;
        }
    }

    // ── Crown ───────────────────────────────────────────────────

    /// Crown radius in metres.
    pub fn crown_radius(&self) -> f32 {
        self.crown_radius
    }

    /// Crown area in m² (`π r²`).
    pub fn crown_area(&self) -> f32 {
        self.crown_area
    }

    /// Set the crown radius; the area follows.
    pub fn set_crown_radius(&mut self, radius: f32) {
        self.crown_radius = radius;
        self.crown_area = radius * radius * PI;
    }

    /// The lower-resolution companion kernel, if linked.
    pub fn reader(&self) -> Option<KernelId> {
        self.reader
    }

    /// Link a reader kernel and adopt its crown radius.
    pub fn set_reader(&mut self, reader: KernelId, reader_crown_radius: f32) {
        self.reader = Some(reader);
        self.set_crown_radius(reader_crown_radius);
    }

    // ── Distances ───────────────────────────────────────────────

    /// Share a distance table with this kernel.
    pub fn attach_distances(&mut self, table: Arc<DistanceTable>) -> Result<(), KernelError> {
        if table.size() < self.internal_size() {
            return Err(KernelError::DistanceTableTooSmall {
                table_size: table.size(),
                required: self.internal_size(),
            });
        }
        self.distances = Some(table);
        Ok(())
    }

    /// Whether a distance table is attached.
    pub fn has_distances(&self) -> bool {
        self.distances.is_some()
    }

    /// Metric distance from internal cell `(ix, iy)` to the tree cell.
    pub fn distance_to_center(&self, ix: i32, iy: i32) -> Result<f32, KernelError> {
        let table = self
            .distances
            .as_ref()
            .ok_or(KernelError::DistanceTableMissing)?;
        let dx = (ix - self.offset as i32).unsigned_abs() as usize;
        let dy = (iy - self.offset as i32).unsigned_abs() as usize;
        table
            .get(dx, dy)
            .ok_or(KernelError::DistanceTableTooSmall {
                table_size: table.size(),
                required: dx.max(dy) + 1,
            })
    }
}

fn clip_width(width: usize) -> usize {
    if width > MAX_LOGICAL_WIDTH {
        warn!(
            requested = width,
            clipped = MAX_LOGICAL_WIDTH,
            "kernel width too large, clipping"
        );
        MAX_LOGICAL_WIDTH
    } else {
        width
    }
}

fn check_offset(size_class: SizeClass, offset: usize) -> Result<(), KernelError> {
    if offset * 2 + 1 > size_class.internal_size() {
        return Err(KernelError::InvalidOffset {
            offset,
            internal_size: size_class.internal_size(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_grid::GridGeometry;

    fn source(side: usize) -> Grid<f32> {
        let geo = GridGeometry::new(2.0, side, side).unwrap();
        let values = (0..side * side).map(|i| i as f32).collect();
        Grid::from_vec(geo, values).unwrap()
    }

    #[test]
    fn for_width_sets_offset_and_class() {
        let k = InfluenceKernel::for_width(7).unwrap();
        assert_eq!(k.offset(), 3);
        assert_eq!(k.logical_size(), 7);
        assert_eq!(k.size_class(), SizeClass::Px8);
        assert!(InfluenceKernel::for_width(6).is_err());
    }

    #[test]
    fn for_width_clips_oversized() {
        let k = InfluenceKernel::for_width(71).unwrap();
        assert_eq!(k.logical_size(), 63);
        assert_eq!(k.size_class(), SizeClass::Px64);
    }

    #[test]
    fn from_values_checks_length_and_offset() {
        assert!(matches!(
            InfluenceKernel::from_values(SizeClass::Px4, 1, vec![0.0; 15]),
            Err(KernelError::ValueCountMismatch {
                expected: 16,
                found: 15
            })
        ));
        assert!(matches!(
            InfluenceKernel::from_values(SizeClass::Px4, 2, vec![0.0; 16]),
            Err(KernelError::InvalidOffset { .. })
        ));
        assert!(InfluenceKernel::from_values(SizeClass::Px4, 1, vec![0.0; 16]).is_ok());
    }

    #[test]
    fn source_grid_window_is_centered() {
        // 25x25 source, width 7: window starts at 12 - 3 = 9.
        let src = source(25);
        let k = InfluenceKernel::from_source_grid(&src, 7).unwrap();
        assert_eq!(k.offset(), 3);
        assert_eq!(k.internal_size(), 8);
        assert_eq!(k.value(0, 0), src[(9, 9)]);
        assert_eq!(k.value(3, 3), src[(12, 12)]);
        assert_eq!(k.value(6, 6), src[(15, 15)]);
        assert_eq!(k.value(7, 7), 0.0);
    }

    #[test]
    fn source_grid_requires_odd_sizes() {
        assert!(matches!(
            InfluenceKernel::from_source_grid(&source(24), 7),
            Err(KernelError::EvenWidth { .. })
        ));
        assert!(matches!(
            InfluenceKernel::from_source_grid(&source(25), 8),
            Err(KernelError::EvenWidth { .. })
        ));
    }

    #[test]
    fn source_grid_narrower_than_width_fails() {
        assert!(matches!(
            InfluenceKernel::from_source_grid(&source(5), 9),
            Err(KernelError::Grid(_))
        ));
    }

    #[test]
    fn distance_requires_table() {
        let mut k = InfluenceKernel::for_width(5).unwrap();
        assert!(matches!(
            k.distance_to_center(0, 0),
            Err(KernelError::DistanceTableMissing)
        ));
        k.attach_distances(Arc::new(DistanceTable::new(8, 2.0).unwrap()))
            .unwrap();
        assert_eq!(k.distance_to_center(2, 2).unwrap(), 0.0);
        assert_eq!(k.distance_to_center(2, 0).unwrap(), 4.0);
        assert_eq!(k.distance_to_center(4, 2).unwrap(), 4.0);
    }

    #[test]
    fn small_table_is_rejected() {
        let mut k = InfluenceKernel::new(SizeClass::Px16);
        let err = k
            .attach_distances(Arc::new(DistanceTable::new(8, 2.0).unwrap()))
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::DistanceTableTooSmall {
                table_size: 8,
                required: 16
            }
        ));
    }

    #[test]
    fn reader_link_copies_crown_radius() {
        let mut k = InfluenceKernel::new(SizeClass::Px8);
        k.set_crown_radius(1.0);
        k.set_reader(KernelId(4), 2.5);
        assert_eq!(k.reader(), Some(KernelId(4)));
        assert_eq!(k.crown_radius(), 2.5);
        assert!((k.crown_area() - 2.5 * 2.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn invert_flips_values() {
        let mut k = InfluenceKernel::from_values(SizeClass::Px4, 1, vec![0.25; 16]).unwrap();
        k.invert();
        assert!(k.values().iter().all(|&v| v == 0.75));
    }

    #[test]
    fn value_from_center_is_offset_relative() {
        let mut k = InfluenceKernel::for_width(3).unwrap();
        k.set_value(2, 1, 0.5);
        assert_eq!(k.value_from_center(1, 0), Some(0.5));
        assert_eq!(k.value_from_center(-2, 0), None);
    }
}
