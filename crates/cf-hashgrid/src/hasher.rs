//! Periodic cell coordinates.
//!
//! A [`CellHasher`] maps continuous local-space positions to integer cell coordinates that
//! wrap modulo `hash_size` on every axis, and packs those coordinates into one mixed-radix
//! cell index in `[0, hash_size^D)`.
//!
//! # Example
//!
//! ```
//! use cf_hashgrid::CellHasher;
//! use nalgebra::Point2;
//!
//! let hasher = CellHasher::<2>::new(1.0, 4).unwrap();
//!
//! // -0.5 floors to cell -1, which wraps to 3
//! assert_eq!(hasher.discretize(&Point2::new(-0.5, 1.5)), [3, 1]);
//! assert_eq!(hasher.hash(&[3, 1]), 3 + 4 * 1);
//! assert_eq!(hasher.unhash(7), [3, 1]);
//! ```

// Cell coordinates are bounded by hash_size, which validation keeps within i64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use nalgebra::Point;
use smallvec::SmallVec;

use crate::config::HashGridConfig;
use crate::error::{HashGridError, HashGridResult};

/// Cells visited by one query: the 3^D block around a home cell, without duplicates.
pub type CellRing = SmallVec<[usize; 27]>;

/// Discretizes positions into a periodic `D`-dimensional cell lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHasher<const D: usize> {
    cell_size: f64,
    hash_size: usize,
    /// `hash_size` as a signed modulus for `rem_euclid`.
    wrap: i64,
}

impl<const D: usize> CellHasher<D> {
    /// Creates a hasher for cells of edge `cell_size`, `hash_size` cells per axis.
    ///
    /// # Errors
    ///
    /// Returns the same configuration errors as [`HashGridConfig::validate`].
    pub fn new(cell_size: f64, hash_size: usize) -> HashGridResult<Self> {
        Self::from_config(&HashGridConfig::new(cell_size, hash_size))
    }

    /// Creates a hasher from the cell parameters of a grid configuration.
    ///
    /// # Errors
    ///
    /// Returns the same configuration errors as [`HashGridConfig::validate`].
    pub fn from_config(config: &HashGridConfig) -> HashGridResult<Self> {
        config.validate::<D>()?;
        let wrap = i64::try_from(config.hash_size)
            .map_err(|_| HashGridError::InvalidHashSize(config.hash_size))?;
        Ok(Self {
            cell_size: config.cell_size,
            hash_size: config.hash_size,
            wrap,
        })
    }

    /// Edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of cells per axis.
    #[must_use]
    pub const fn hash_size(&self) -> usize {
        self.hash_size
    }

    /// Total number of cells, `hash_size^D`.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        (0..D).fold(1, |count, _| count * self.hash_size)
    }

    /// Length of one period of the lattice along each axis.
    #[must_use]
    pub fn period(&self) -> f64 {
        self.hash_size as f64 * self.cell_size
    }

    /// Wraps an integer cell coordinate into `[0, hash_size)`.
    ///
    /// Negative inputs use the mathematical modulo, so `-1` maps to `hash_size - 1`.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_hashgrid::CellHasher;
    ///
    /// let hasher = CellHasher::<3>::new(1.0, 5).unwrap();
    /// assert_eq!(hasher.repeat(7), 2);
    /// assert_eq!(hasher.repeat(-1), 4);
    /// assert_eq!(hasher.repeat(-10), 0);
    /// ```
    #[must_use]
    pub const fn repeat(&self, x: i64) -> usize {
        x.rem_euclid(self.wrap) as usize
    }

    /// Unwrapped cell coordinate, `floor(p / cell_size)` per axis.
    ///
    /// The float to integer conversion saturates, and NaN maps to 0.
    #[must_use]
    pub fn cell_coord(&self, p: &Point<f64, D>) -> [i64; D] {
        let mut coord = [0; D];
        for (axis, c) in coord.iter_mut().enumerate() {
            *c = (p[axis] / self.cell_size).floor() as i64;
        }
        coord
    }

    /// Wrapped cell coordinate of a position.
    #[must_use]
    pub fn discretize(&self, p: &Point<f64, D>) -> [usize; D] {
        self.cell_coord(p).map(|c| self.repeat(c))
    }

    /// Packs wrapped coordinates as `c0 + hash_size * (c1 + hash_size * (c2 + ...))`.
    #[must_use]
    pub fn hash(&self, coord: &[usize; D]) -> usize {
        debug_assert!(coord.iter().all(|&c| c < self.hash_size));
        coord
            .iter()
            .rev()
            .fold(0, |acc, &c| acc * self.hash_size + c)
    }

    /// Inverse of [`hash`](Self::hash) for indices in `[0, cell_count)`.
    #[must_use]
    pub fn unhash(&self, mut index: usize) -> [usize; D] {
        let mut coord = [0; D];
        for c in &mut coord {
            *c = index % self.hash_size;
            index /= self.hash_size;
        }
        coord
    }

    /// Cell index of a position.
    #[must_use]
    pub fn hash_point(&self, p: &Point<f64, D>) -> usize {
        self.hash(&self.discretize(p))
    }

    /// The 1-ring around the cell containing `p`: the home cell and its neighbors at
    /// offset -1, 0 or +1 on every axis, each wrapped.
    ///
    /// When `hash_size < 3` several offsets wrap onto the same cell; each cell appears once.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_hashgrid::CellHasher;
    /// use nalgebra::{Point2, Point3};
    ///
    /// let hasher = CellHasher::<3>::new(1.0, 8).unwrap();
    /// assert_eq!(hasher.ring(&Point3::new(0.5, 0.5, 0.5)).len(), 27);
    ///
    /// let tiny = CellHasher::<2>::new(1.0, 2).unwrap();
    /// assert_eq!(tiny.ring(&Point2::new(0.5, 0.5)).len(), 4);
    /// ```
    #[must_use]
    pub fn ring(&self, p: &Point<f64, D>) -> CellRing {
        let home = self.discretize(p);
        let block = 3usize.pow(D as u32);
        let mut ring = CellRing::new();

        for code in 0..block {
            let mut digits = code;
            let mut coord = [0; D];
            for (axis, c) in coord.iter_mut().enumerate() {
                let offset = (digits % 3) as i64 - 1;
                digits /= 3;
                *c = self.repeat(home[axis] as i64 + offset);
            }
            let cell = self.hash(&coord);
            if !ring.contains(&cell) {
                ring.push(cell);
            }
        }
        ring
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nalgebra::{Point1, Point2, Point3};

    use super::*;

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(matches!(
            CellHasher::<2>::new(0.0, 4),
            Err(HashGridError::InvalidCellSize(_))
        ));
        assert_eq!(
            CellHasher::<2>::new(1.0, 0),
            Err(HashGridError::InvalidHashSize(0))
        );
    }

    #[test]
    fn test_repeat() {
        let hasher = CellHasher::<2>::new(1.0, 4).unwrap();
        assert_eq!(hasher.repeat(0), 0);
        assert_eq!(hasher.repeat(3), 3);
        assert_eq!(hasher.repeat(4), 0);
        assert_eq!(hasher.repeat(-1), 3);
        assert_eq!(hasher.repeat(-4), 0);
        assert_eq!(hasher.repeat(-5), 3);
        assert!(hasher.repeat(i64::MIN) < 4);
        assert!(hasher.repeat(i64::MAX) < 4);
    }

    #[test]
    fn test_discretize_floors() {
        let hasher = CellHasher::<2>::new(0.5, 10).unwrap();
        assert_eq!(hasher.cell_coord(&Point2::new(0.25, 1.1)), [0, 2]);
        assert_eq!(hasher.cell_coord(&Point2::new(-0.25, -0.5)), [-1, -1]);
        assert_eq!(hasher.discretize(&Point2::new(-0.25, -0.75)), [9, 8]);
    }

    #[test]
    fn test_discretize_extreme_values() {
        let hasher = CellHasher::<3>::new(1.0, 7).unwrap();
        for p in [
            Point3::new(1e300, -1e300, 0.0),
            Point3::new(f64::INFINITY, f64::NEG_INFINITY, f64::NAN),
        ] {
            let coord = hasher.discretize(&p);
            assert!(coord.iter().all(|&c| c < 7));
            assert!(hasher.hash(&coord) < hasher.cell_count());
        }
    }

    #[test]
    fn test_hash_layout_2d() {
        let hasher = CellHasher::<2>::new(1.0, 4).unwrap();
        assert_eq!(hasher.hash(&[0, 0]), 0);
        assert_eq!(hasher.hash(&[3, 0]), 3);
        assert_eq!(hasher.hash(&[0, 1]), 4);
        assert_eq!(hasher.hash(&[3, 3]), 15);
    }

    #[test]
    fn test_hash_layout_3d() {
        let hasher = CellHasher::<3>::new(1.0, 5).unwrap();
        assert_eq!(hasher.hash(&[1, 2, 3]), 1 + 5 * (2 + 5 * 3));
        assert_eq!(hasher.unhash(1 + 5 * (2 + 5 * 3)), [1, 2, 3]);
    }

    #[test]
    fn test_hash_unhash_exhaustive() {
        let hasher = CellHasher::<3>::new(1.0, 6).unwrap();
        for index in 0..hasher.cell_count() {
            assert_eq!(hasher.hash(&hasher.unhash(index)), index);
        }
    }

    #[test]
    fn test_cell_count_and_period() {
        let hasher = CellHasher::<3>::new(0.5, 4).unwrap();
        assert_eq!(hasher.cell_count(), 64);
        assert!((hasher.period() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ring_sizes() {
        let p1 = Point1::new(0.5);
        let p2 = Point2::new(0.5, 0.5);
        let p3 = Point3::new(0.5, 0.5, 0.5);

        assert_eq!(CellHasher::<1>::new(1.0, 5).unwrap().ring(&p1).len(), 3);
        assert_eq!(CellHasher::<2>::new(1.0, 5).unwrap().ring(&p2).len(), 9);
        assert_eq!(CellHasher::<3>::new(1.0, 5).unwrap().ring(&p3).len(), 27);
    }

    #[test]
    fn test_ring_wraps_at_boundary() {
        let hasher = CellHasher::<2>::new(1.0, 4).unwrap();
        let ring = hasher.ring(&Point2::new(0.1, 0.1));

        // Column 3 is adjacent to column 0
        assert!(ring.contains(&hasher.hash(&[3, 0])));
        assert!(ring.contains(&hasher.hash(&[3, 3])));
        assert!(ring.contains(&hasher.hash(&[1, 1])));
        assert!(!ring.contains(&hasher.hash(&[2, 0])));
    }

    #[test]
    fn test_ring_dedups_small_tables() {
        let single = CellHasher::<3>::new(1.0, 1).unwrap();
        assert_eq!(single.ring(&Point3::new(5.0, -3.0, 0.2)).as_slice(), &[0]);

        let pair = CellHasher::<3>::new(1.0, 2).unwrap();
        let ring = pair.ring(&Point3::new(0.5, 0.5, 0.5));
        assert_eq!(ring.len(), 8);
    }
}
