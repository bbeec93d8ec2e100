//! Hit cloud types for calorimeter event data.

use crate::error::{Error, Result};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in detector space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Computes the squared Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Computes the Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns true if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns the components as an array.
    #[inline]
    #[must_use]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Position {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Position {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Position {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Position {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Position {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// The hits of one event: parallel position and energy sequences.
///
/// Construction validates that both sequences have the same length, that
/// every coordinate is finite and that every energy is finite and
/// non-negative. Strategies rely on these invariants.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HitCloud {
    positions: Vec<Position>,
    energies: Vec<f64>,
}

impl HitCloud {
    /// Creates a hit cloud from parallel position and energy vectors.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the lengths differ,
    /// [`Error::NonFiniteCoordinate`] or [`Error::InvalidEnergy`] if a value
    /// is out of range.
    pub fn new(positions: Vec<Position>, energies: Vec<f64>) -> Result<Self> {
        if positions.len() != energies.len() {
            return Err(Error::ShapeMismatch {
                positions: positions.len(),
                energies: energies.len(),
            });
        }
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::NonFiniteCoordinate { index });
        }
        if let Some((index, &value)) = energies
            .iter()
            .enumerate()
            .find(|(_, e)| !e.is_finite() || **e < 0.0)
        {
            return Err(Error::InvalidEnergy { index, value });
        }
        Ok(Self {
            positions,
            energies,
        })
    }

    /// Creates a hit cloud from columnar `x`, `y`, `z` and energy slices.
    ///
    /// # Errors
    /// Returns [`Error::ColumnMismatch`] if the coordinate columns differ in
    /// length, otherwise the same errors as [`HitCloud::new`].
    pub fn from_columns(x: &[f64], y: &[f64], z: &[f64], energy: &[f64]) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(Error::ColumnMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        let positions = x
            .iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| Position::new(x, y, z))
            .collect();
        Self::new(positions, energy.to_vec())
    }

    /// Returns the number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the cloud has no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Hit positions.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Hit energies, parallel to [`HitCloud::positions`].
    #[must_use]
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Sum of all hit energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }

    /// Iterates over `(position, energy)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.positions.iter().zip(self.energies.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_position_distance() {
        let p1 = Position::new(0.0, 0.0, 0.0);
        let p2 = Position::new(1.0, 2.0, 2.0);
        assert_abs_diff_eq!(p1.distance_squared(&p2), 9.0);
        assert_abs_diff_eq!(p2.distance(&p1), 3.0);
    }

    #[test]
    fn test_position_arithmetic() {
        let mut p = Position::new(1.0, 2.0, 3.0);
        p += Position::new(1.0, 1.0, 1.0);
        assert_eq!(p, Position::new(2.0, 3.0, 4.0));
        assert_eq!(p * 2.0, Position::new(4.0, 6.0, 8.0));
        assert_eq!(p / 2.0, Position::new(1.0, 1.5, 2.0));
        assert_eq!(p - p, Position::ORIGIN);
    }

    #[test]
    fn test_hit_cloud_from_columns() {
        let cloud = HitCloud::from_columns(
            &[0.0, 10.0],
            &[0.0, 0.0],
            &[0.0, 5.0],
            &[1.0, 2.5],
        )
        .unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.positions()[1], Position::new(10.0, 0.0, 5.0));
        assert_abs_diff_eq!(cloud.total_energy(), 3.5);
    }

    #[test]
    fn test_hit_cloud_rejects_shape_mismatch() {
        let err = HitCloud::new(vec![Position::ORIGIN; 3], vec![1.0; 2]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                positions: 3,
                energies: 2
            }
        ));

        let err = HitCloud::from_columns(&[0.0; 2], &[0.0; 3], &[0.0; 2], &[1.0; 2]).unwrap_err();
        assert!(matches!(err, Error::ColumnMismatch { x: 2, y: 3, z: 2 }));
    }

    #[test]
    fn test_hit_cloud_rejects_bad_values() {
        let err = HitCloud::new(vec![Position::ORIGIN; 2], vec![1.0, -0.5]).unwrap_err();
        assert!(matches!(err, Error::InvalidEnergy { index: 1, .. }));

        let err = HitCloud::new(
            vec![Position::ORIGIN, Position::new(f64::NAN, 0.0, 0.0)],
            vec![1.0, 1.0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::NonFiniteCoordinate { index: 1 }));
    }

    #[test]
    fn test_empty_cloud() {
        let cloud = HitCloud::default();
        assert!(cloud.is_empty());
        assert_abs_diff_eq!(cloud.total_energy(), 0.0);
    }
}
