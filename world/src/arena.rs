//! Diamond arena geometry shared by every snapshot.

use siege_sim_core::{CellCoord, Edge, Owner};

/// Shape of the diamond arena inscribed in a square bounding box.
///
/// Rows below the midline widen by one cell on each side per row, rows above
/// it narrow again, so every edge is a diagonal staircase of `size / 2` cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Arena {
    size: u32,
    half: u32,
}

impl Arena {
    /// Creates an arena with the provided bounding-box side length.
    #[must_use]
    pub const fn new(size: u32) -> Self {
        Self {
            size,
            half: size / 2,
        }
    }

    /// Side length of the bounding box.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of cells in the bounding box, including cells outside the diamond.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let size = usize::try_from(self.size).unwrap_or(0);
        size.saturating_mul(size)
    }

    /// Reports whether `cell` lies inside the diamond.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let (x, y) = (cell.x(), cell.y());
        if y >= self.size || x >= self.size {
            return false;
        }

        if y < self.half {
            x >= self.half - 1 - y && x <= self.half + y
        } else {
            let offset = y - self.half;
            x >= offset && x <= self.size - 1 - offset
        }
    }

    /// Row-major offset of `cell` within the bounding box.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() >= self.size || cell.y() >= self.size {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let x = usize::try_from(cell.x()).ok()?;
        let y = usize::try_from(cell.y()).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// Inverse of [`Arena::index`].
    #[must_use]
    pub fn coord(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.size).ok()?;
        if width == 0 || index >= self.cell_count() {
            return None;
        }
        let x = u32::try_from(index % width).ok()?;
        let y = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(x, y))
    }

    /// Cells composing `edge`, ordered from the midline toward the tip.
    #[must_use]
    pub fn edge_cells(&self, edge: Edge) -> Vec<CellCoord> {
        let last = self.size.saturating_sub(1);
        (0..self.half)
            .map(|i| match edge {
                Edge::TopRight => CellCoord::new(self.half + i, last - i),
                Edge::TopLeft => CellCoord::new(self.half - 1 - i, last - i),
                Edge::BottomLeft => CellCoord::new(self.half - 1 - i, i),
                Edge::BottomRight => CellCoord::new(self.half + i, i),
            })
            .collect()
    }

    /// Edge that contains `cell`, if any.
    #[must_use]
    pub fn edge_of(&self, cell: CellCoord) -> Option<Edge> {
        Edge::ALL
            .into_iter()
            .find(|edge| self.edge_cells(*edge).contains(&cell))
    }

    /// Row of `cell` counted from `owner`'s side of the arena.
    #[must_use]
    pub fn row_from_owner(&self, cell: CellCoord, owner: Owner) -> u32 {
        match owner {
            Owner::Ally => cell.y(),
            Owner::Opponent => self.size.saturating_sub(1).saturating_sub(cell.y()),
        }
    }

    /// Orthogonal in-arena neighbours of `cell`.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        let mut candidates = [None; 4];
        let mut count = 0;

        if let Some(y) = cell.y().checked_add(1) {
            candidates[count] = Some(CellCoord::new(cell.x(), y));
            count += 1;
        }
        if let Some(x) = cell.x().checked_add(1) {
            candidates[count] = Some(CellCoord::new(x, cell.y()));
            count += 1;
        }
        if let Some(y) = cell.y().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(cell.x(), y));
            count += 1;
        }
        if let Some(x) = cell.x().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(x, cell.y()));
            count += 1;
        }

        candidates
            .into_iter()
            .take(count)
            .flatten()
            .filter(move |candidate| self.contains(*candidate))
    }

    /// Every in-arena cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.size)
            .flat_map(move |y| (0..self.size).map(move |x| CellCoord::new(x, y)))
            .filter(move |cell| self.contains(*cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_arena_rows_form_a_diamond() {
        let arena = Arena::new(28);
        assert!(arena.contains(CellCoord::new(13, 0)));
        assert!(arena.contains(CellCoord::new(14, 0)));
        assert!(!arena.contains(CellCoord::new(12, 0)));
        assert!(!arena.contains(CellCoord::new(15, 0)));
        assert!(arena.contains(CellCoord::new(0, 13)));
        assert!(arena.contains(CellCoord::new(27, 14)));
        assert!(arena.contains(CellCoord::new(13, 27)));
        assert!(!arena.contains(CellCoord::new(0, 27)));
        assert!(!arena.contains(CellCoord::new(28, 14)));
    }

    #[test]
    fn cell_count_inside_diamond_matches_closed_form() {
        let arena = Arena::new(28);
        // Each half holds 2 + 4 + ... + 28 cells.
        assert_eq!(arena.cells().count(), 2 * (14 * 15));
    }

    #[test]
    fn edges_are_disjoint_in_arena_staircases() {
        let arena = Arena::new(28);
        let mut seen = Vec::new();
        for edge in Edge::ALL {
            let cells = arena.edge_cells(edge);
            assert_eq!(cells.len(), 14);
            for cell in cells {
                assert!(arena.contains(cell), "{cell:?} on {edge:?} is outside");
                assert_eq!(arena.edge_of(cell), Some(edge));
                assert!(!seen.contains(&cell), "{cell:?} belongs to two edges");
                seen.push(cell);
            }
        }
    }

    #[test]
    fn bottom_tip_belongs_to_bottom_left() {
        let arena = Arena::new(28);
        assert_eq!(arena.edge_of(CellCoord::new(13, 0)), Some(Edge::BottomLeft));
        let right_tip = arena.edge_of(CellCoord::new(14, 0));
        assert_eq!(right_tip, Some(Edge::BottomRight));
        assert_eq!(arena.edge_of(CellCoord::new(13, 5)), None);
    }

    #[test]
    fn index_and_coord_are_inverse() {
        let arena = Arena::new(28);
        for cell in arena.cells() {
            let index = arena.index(cell).expect("in bounds");
            assert_eq!(arena.coord(index), Some(cell));
        }
        assert_eq!(arena.index(CellCoord::new(28, 0)), None);
    }

    #[test]
    fn neighbors_stay_inside_the_diamond() {
        let arena = Arena::new(28);
        let tip: Vec<_> = arena.neighbors(CellCoord::new(13, 0)).collect();
        assert_eq!(tip, vec![CellCoord::new(13, 1), CellCoord::new(14, 0)]);
    }

    #[test]
    fn rows_are_mirrored_for_the_opponent() {
        let arena = Arena::new(28);
        let cell = CellCoord::new(10, 20);
        assert_eq!(arena.row_from_owner(cell, Owner::Ally), 20);
        assert_eq!(arena.row_from_owner(cell, Owner::Opponent), 7);
    }
}
