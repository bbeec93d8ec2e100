//! Spatial indexing for efficient neighbor lookup.

use calopix_core::Position;
use std::collections::HashMap;

/// Spatial hash for 3D radius queries.
///
/// Space is divided into cubic cells of edge `cell_size`. A radius query
/// with `radius <= cell_size` only has to visit the 3x3x3 block of cells
/// around the query point.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Create a grid indexing every position by its slice index.
    pub fn from_positions(cell_size: f64, positions: &[Position]) -> Self {
        let mut grid = Self::new(cell_size);
        for (i, p) in positions.iter().enumerate() {
            grid.insert(p, i);
        }
        grid
    }

    /// Cell edge length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of populated cells.
    pub fn populated_cells(&self) -> usize {
        self.cells.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: &Position) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    /// Insert an index at the given position.
    pub fn insert(&mut self, p: &Position, index: usize) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Query the 3x3x3 neighborhood around a point.
    pub fn query_neighborhood(&self, p: &Position) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy, cz) = self.cell_of(p);
        let mut keys = Vec::with_capacity(27);
        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                for dz in -1..=1_i64 {
                    if let (Some(x), Some(y), Some(z)) =
                        (cx.checked_add(dx), cy.checked_add(dy), cz.checked_add(dz))
                    {
                        keys.push((x, y, z));
                    }
                }
            }
        }
        keys.into_iter()
            .filter_map(move |key| self.cells.get(&key))
            .flatten()
            .copied()
    }

    /// Collect every indexed point within `radius` of `center` into `out`.
    ///
    /// `positions` must be the slice the grid was built from, and `radius`
    /// must not exceed the cell size.
    pub fn within_radius_into(
        &self,
        center: &Position,
        radius: f64,
        positions: &[Position],
        out: &mut Vec<usize>,
    ) {
        debug_assert!(radius <= self.cell_size);
        let radius_sq = radius * radius;
        out.clear();
        out.extend(
            self.query_neighborhood(center)
                .filter(|&j| positions[j].distance_squared(center) <= radius_sq),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid() {
        let positions = vec![
            Position::new(100.0, 100.0, 0.0),
            Position::new(105.0, 105.0, 5.0),
            Position::new(300.0, 300.0, 0.0),
        ];
        let grid = SpatialGrid::from_positions(32.0, &positions);

        let neighbors: Vec<_> = grid.query_neighborhood(&positions[0]).collect();
        assert!(neighbors.contains(&0));
        assert!(neighbors.contains(&1));
        assert!(!neighbors.contains(&2));
    }

    #[test]
    fn test_within_radius_is_exact() {
        let positions = vec![
            Position::new(0.0, 0.0, 0.0),
            Position::new(3.0, 4.0, 0.0),
            Position::new(3.0, 4.0, 0.1),
            Position::new(-2.0, -2.0, -2.0),
        ];
        let grid = SpatialGrid::from_positions(5.0, &positions);
        let mut out = Vec::new();
        grid.within_radius_into(&positions[0], 5.0, &positions, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1, 3]);
    }

    #[test]
    fn test_negative_coordinates_share_neighborhood() {
        let positions = vec![Position::new(-0.5, 0.0, 0.0), Position::new(0.5, 0.0, 0.0)];
        let grid = SpatialGrid::from_positions(10.0, &positions);
        assert_eq!(grid.populated_cells(), 2);
        let mut out = Vec::new();
        grid.within_radius_into(&positions[0], 1.0, &positions, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_infinite_cell_size() {
        let positions = vec![Position::new(-1e9, 0.0, 0.0), Position::new(1e9, 5.0, 0.0)];
        let grid = SpatialGrid::from_positions(f64::INFINITY, &positions);
        let mut out = Vec::new();
        grid.within_radius_into(&positions[0], f64::INFINITY, &positions, &mut out);
        assert_eq!(out.len(), 2);
    }
}
