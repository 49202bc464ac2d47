//! Splitting work units into interference-free phases.
//!
//! Units that run in the same phase must never write overlapping grid
//! cells. The scheduler does not verify this; the partition strategy
//! encodes it:
//!
//! ```text
//!  IndexParity      Checkerboard     Quadrants
//!  (list order)     (x + y) % 2      (x % 2, y % 2)
//!  A B A B A        A B A B          C D C D
//!                   B A B A          A B A B
//!                   A B A B          C D C D
//! ```
//!
//! Index parity is only safe if the list order already alternates in
//! space. Checkerboard separates edge neighbours; quadrants also
//! separate diagonal neighbours.

use tracing::warn;

/// Position-aware work unit.
///
/// `grid_position` is the unit's column and row in the unit layout (not
/// a light-grid cell). Units that cannot report one fall back to index
/// parity.
pub trait SpatialUnit {
    /// Column and row of the unit, if known.
    fn grid_position(&self) -> Option<(i32, i32)> {
        None
    }
}

/// How a unit collection is split into phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PartitionStrategy {
    /// Alternate by position in the list: 1st, 3rd, ... then 2nd, 4th, ...
    IndexParity,
    /// Two phases by the parity of `x + y`.
    Checkerboard,
    /// Four phases by `(x mod 2, y mod 2)`.
    Quadrants,
    /// [`Quadrants`](Self::Quadrants) when every unit reports a position,
    /// otherwise [`IndexParity`](Self::IndexParity).
    #[default]
    Auto,
}

/// Phases computed for one unit collection.
///
/// Every unit index appears in exactly one phase; phases keep the
/// collection's order internally and may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    strategy: PartitionStrategy,
    phases: Vec<Vec<usize>>,
    unit_count: usize,
}

impl PartitionPlan {
    /// The A/B alternation over `len` units.
    pub fn index_parity(len: usize) -> Self {
        let a = (0..len).step_by(2).collect();
        let b = (1..len).step_by(2).collect();
        Self {
            strategy: PartitionStrategy::IndexParity,
            phases: vec![a, b],
            unit_count: len,
        }
    }

    /// Plan `units` with `strategy`.
    ///
    /// A spatial strategy requested for units without positions falls
    /// back to index parity with a warning.
    pub fn build<U: SpatialUnit>(units: &[U], strategy: PartitionStrategy) -> Self {
        let positions: Option<Vec<(i32, i32)>> =
            units.iter().map(SpatialUnit::grid_position).collect();
        match (strategy, positions) {
            (PartitionStrategy::IndexParity, _) => Self::index_parity(units.len()),
            (PartitionStrategy::Checkerboard, Some(pos)) => Self::colored(
                PartitionStrategy::Checkerboard,
                &pos,
                2,
                |(x, y)| (x + y).rem_euclid(2) as usize,
            ),
            (PartitionStrategy::Quadrants | PartitionStrategy::Auto, Some(pos)) => Self::colored(
                PartitionStrategy::Quadrants,
                &pos,
                4,
                |(x, y)| (x.rem_euclid(2) + 2 * y.rem_euclid(2)) as usize,
            ),
            (PartitionStrategy::Auto, None) => Self::index_parity(units.len()),
            (requested, None) => {
                warn!(
                    ?requested,
                    units = units.len(),
                    "units lack grid positions, falling back to index parity"
                );
                Self::index_parity(units.len())
            }
        }
    }

    fn colored(
        strategy: PartitionStrategy,
        positions: &[(i32, i32)],
        colors: usize,
        color: impl Fn((i32, i32)) -> usize,
    ) -> Self {
        let mut phases = vec![Vec::new(); colors];
        for (i, &p) in positions.iter().enumerate() {
            phases[color(p)].push(i);
        }
        Self {
            strategy,
            phases,
            unit_count: positions.len(),
        }
    }

    /// The strategy actually used (never `Auto`).
    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    /// Unit indices per phase, in execution order.
    pub fn phases(&self) -> &[Vec<usize>] {
        &self.phases
    }

    /// Number of units the plan covers.
    pub fn unit_count(&self) -> usize {
        self.unit_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Anon;
    impl SpatialUnit for Anon {}

    struct At(i32, i32);
    impl SpatialUnit for At {
        fn grid_position(&self) -> Option<(i32, i32)> {
            Some((self.0, self.1))
        }
    }

    fn grid_units(cols: i32, rows: i32) -> Vec<At> {
        (0..rows)
            .flat_map(|y| (0..cols).map(move |x| At(x, y)))
            .collect()
    }

    #[test]
    fn five_units_alternate() {
        let plan = PartitionPlan::index_parity(5);
        assert_eq!(plan.phases(), &[vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn auto_without_positions_uses_parity() {
        let units: Vec<Anon> = (0..4).map(|_| Anon).collect();
        let plan = PartitionPlan::build(&units, PartitionStrategy::Auto);
        assert_eq!(plan.strategy(), PartitionStrategy::IndexParity);
        assert_eq!(plan.phases(), &[vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn explicit_spatial_strategy_falls_back() {
        let units: Vec<Anon> = (0..3).map(|_| Anon).collect();
        let plan = PartitionPlan::build(&units, PartitionStrategy::Checkerboard);
        assert_eq!(plan.strategy(), PartitionStrategy::IndexParity);
    }

    #[test]
    fn checkerboard_separates_edge_neighbours() {
        let units = grid_units(4, 3);
        let plan = PartitionPlan::build(&units, PartitionStrategy::Checkerboard);
        assert_eq!(plan.phases().len(), 2);
        for phase in plan.phases() {
            for &a in phase {
                for &b in phase {
                    let (ua, ub) = (&units[a], &units[b]);
                    let manhattan = (ua.0 - ub.0).abs() + (ua.1 - ub.1).abs();
                    assert_ne!(manhattan, 1);
                }
            }
        }
    }

    #[test]
    fn parity_fails_for_even_row_width() {
        // A 4-wide layout in row-major order puts vertical neighbours in
        // the same parity phase: the reason spatial strategies exist.
        let units = grid_units(4, 2);
        let plan = PartitionPlan::build(&units, PartitionStrategy::IndexParity);
        let a = &plan.phases()[0];
        assert!(a.contains(&0) && a.contains(&4));
    }

    #[test]
    fn quadrants_separate_diagonal_neighbours() {
        let units = grid_units(5, 5);
        let plan = PartitionPlan::build(&units, PartitionStrategy::Auto);
        assert_eq!(plan.strategy(), PartitionStrategy::Quadrants);
        assert_eq!(plan.phases().len(), 4);
        for phase in plan.phases() {
            for &a in phase {
                for &b in phase {
                    if a == b {
                        continue;
                    }
                    let (ua, ub) = (&units[a], &units[b]);
                    let chebyshev = (ua.0 - ub.0).abs().max((ua.1 - ub.1).abs());
                    assert!(chebyshev >= 2);
                }
            }
        }
    }

    #[test]
    fn negative_positions_are_colored() {
        let units = vec![At(-1, -1), At(0, -1), At(-1, 0), At(0, 0)];
        let plan = PartitionPlan::build(&units, PartitionStrategy::Quadrants);
        assert!(plan.phases().iter().all(|p| p.len() == 1));
    }

    proptest! {
        #[test]
        fn parity_is_a_balanced_partition(n in 0usize..500) {
            let plan = PartitionPlan::index_parity(n);
            let a = &plan.phases()[0];
            let b = &plan.phases()[1];
            prop_assert_eq!(a.len(), n.div_ceil(2));
            prop_assert_eq!(b.len(), n / 2);
            let mut all: Vec<usize> = a.iter().chain(b).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
            prop_assert_eq!(plan, PartitionPlan::index_parity(n));
        }

        #[test]
        fn spatial_plans_cover_every_unit_once(
            cols in 1i32..12,
            rows in 1i32..12,
            quads in any::<bool>(),
        ) {
            let units = grid_units(cols, rows);
            let strategy = if quads { PartitionStrategy::Quadrants } else { PartitionStrategy::Checkerboard };
            let plan = PartitionPlan::build(&units, strategy);
            let mut all: Vec<usize> = plan.phases().iter().flatten().copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..units.len()).collect::<Vec<_>>());
        }
    }
}
