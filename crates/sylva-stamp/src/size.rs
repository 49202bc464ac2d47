//! The ladder of internal kernel sizes.

/// Widest logical kernel; larger requests are clipped.
pub const MAX_LOGICAL_WIDTH: usize = 63;

/// Internal (storage) side length of a kernel.
///
/// Kernels are stored in one of eight fixed square sizes; the logical
/// footprint (always odd) sits in the south-west corner of the array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeClass {
    /// 4x4 cells.
    Px4,
    /// 8x8 cells.
    Px8,
    /// 12x12 cells.
    Px12,
    /// 16x16 cells.
    Px16,
    /// 24x24 cells.
    Px24,
    /// 32x32 cells.
    Px32,
    /// 48x48 cells.
    Px48,
    /// 64x64 cells.
    Px64,
}

impl SizeClass {
    /// Every class, smallest first.
    pub const ALL: [SizeClass; 8] = [
        SizeClass::Px4,
        SizeClass::Px8,
        SizeClass::Px12,
        SizeClass::Px16,
        SizeClass::Px24,
        SizeClass::Px32,
        SizeClass::Px48,
        SizeClass::Px64,
    ];

    /// Side length of the internal array.
    pub const fn internal_size(self) -> usize {
        match self {
            Self::Px4 => 4,
            Self::Px8 => 8,
            Self::Px12 => 12,
            Self::Px16 => 16,
            Self::Px24 => 24,
            Self::Px32 => 32,
            Self::Px48 => 48,
            Self::Px64 => 64,
        }
    }

    /// Number of stored values (`internal_size²`).
    pub const fn cell_count(self) -> usize {
        self.internal_size() * self.internal_size()
    }

    /// Widest odd logical footprint this class can hold.
    pub const fn max_logical_width(self) -> usize {
        self.internal_size() - 1
    }

    /// Smallest class whose internal size is at least `width`.
    ///
    /// Widths beyond 64 map to [`SizeClass::Px64`].
    pub fn for_width(width: usize) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.internal_size() >= width)
            .unwrap_or(Self::Px64)
    }

    /// The class with exactly this internal size.
    pub fn from_internal_size(size: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.internal_size() == size)
    }
}
