//! Hash grid configuration.

use nalgebra::Point;

use crate::error::{HashGridError, HashGridResult};

/// Largest dimension the 1-ring walk supports (`3^3 = 27` cells).
pub const MAX_DIMENSION: usize = 3;

/// How cell membership is stored after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BucketStrategy {
    /// Points are sorted by cell and each cell stores a `(start, len)` range.
    ///
    /// Build is `O(n log n)`, and point ids are permuted by the sort.
    #[default]
    Sorted,
    /// Each cell owns a list of point ids.
    ///
    /// Build is `O(n + cells)`, and point ids keep insertion order.
    Lists,
}

/// How the distance between a query position and a candidate point is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Raw Euclidean distance in local space.
    ///
    /// Wrapping only aliases distant cells onto the table; aliased points far away are
    /// filtered out by the radius test.
    #[default]
    Euclidean,
    /// Minimum-image distance on the torus of period `hash_size * cell_size` per axis.
    Periodic,
}

impl DistanceMetric {
    /// Squared distance between `a` and `b`, using `period` for the periodic metric.
    #[must_use]
    pub fn sqr_distance<const D: usize>(
        self,
        a: &Point<f64, D>,
        b: &Point<f64, D>,
        period: f64,
    ) -> f64 {
        let mut sum = 0.0;
        for axis in 0..D {
            let mut delta = a[axis] - b[axis];
            if self == Self::Periodic {
                delta -= period * (delta / period).round();
            }
            sum = delta.mul_add(delta, sum);
        }
        sum
    }
}

/// Parameters for a [`HashGrid`](crate::HashGrid).
///
/// Validation happens at [`HashGrid::build`](crate::HashGrid::build), so an invalid
/// configuration never disturbs an already built grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HashGridConfig {
    /// Edge length of a cell in local units. Must be positive and finite. Default: 1.0
    pub cell_size: f64,

    /// Number of cells per axis; coordinates wrap modulo this value. Default: 37
    pub hash_size: usize,

    /// Cell storage layout. Default: [`BucketStrategy::Sorted`]
    pub strategy: BucketStrategy,

    /// Distance used by the radius test. Default: [`DistanceMetric::Euclidean`]
    pub metric: DistanceMetric,

    /// Squared distances at or below this value are ignored by nearest queries.
    /// Default: 1e-10
    pub nearest_epsilon: f64,
}

impl Default for HashGridConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            hash_size: 37,
            strategy: BucketStrategy::Sorted,
            metric: DistanceMetric::Euclidean,
            nearest_epsilon: 1e-10,
        }
    }
}

impl HashGridConfig {
    /// Create a config with the given cell size and buckets per axis.
    #[must_use]
    pub fn new(cell_size: f64, hash_size: usize) -> Self {
        Self {
            cell_size,
            hash_size,
            ..Default::default()
        }
    }

    /// Set the bucketing strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: BucketStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the distance metric.
    #[must_use]
    pub const fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the nearest-query epsilon (a squared distance). Negative values are clamped to 0.
    #[must_use]
    pub fn with_nearest_epsilon(mut self, epsilon: f64) -> Self {
        self.nearest_epsilon = epsilon.max(0.0);
        self
    }

    /// Squared radius of the neighbor test, `2 * cell_size^2`.
    ///
    /// The 3^D block of cells around a query only guarantees to contain every point closer
    /// than `cell_size`. Points between `cell_size` and `cell_size * sqrt(2)` are reported
    /// when their cell lies in the block. A larger radius needs a wider ring, not a larger
    /// threshold.
    #[must_use]
    pub fn neighbor_radius_sq(&self) -> f64 {
        2.0 * self.cell_size * self.cell_size
    }

    /// Total number of cells for a `D`-dimensional grid, or `None` on overflow.
    #[must_use]
    pub fn cell_count<const D: usize>(&self) -> Option<usize> {
        let exp = u32::try_from(D).ok()?;
        self.hash_size.checked_pow(exp)
    }

    /// Check the configuration for a `D`-dimensional grid.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a non-positive or non-finite cell size, a zero hash
    /// size, a period or query radius that overflows `f64`, an unsupported dimension, or a
    /// cell table that would overflow `usize`.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate<const D: usize>(&self) -> HashGridResult<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(HashGridError::InvalidCellSize(self.cell_size));
        }
        if self.hash_size == 0 || i64::try_from(self.hash_size).is_err() {
            return Err(HashGridError::InvalidHashSize(self.hash_size));
        }
        let period = self.hash_size as f64 * self.cell_size;
        if !period.is_finite() || !self.neighbor_radius_sq().is_finite() {
            return Err(HashGridError::ExtentOverflow {
                cell_size: self.cell_size,
                hash_size: self.hash_size,
            });
        }
        if D == 0 || D > MAX_DIMENSION {
            return Err(HashGridError::UnsupportedDimension(D));
        }
        if self.cell_count::<D>().is_none() {
            return Err(HashGridError::CellTableOverflow {
                hash_size: self.hash_size,
                dimension: D,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = HashGridConfig::default();
        assert_eq!(config.cell_size, 1.0);
        assert_eq!(config.hash_size, 37);
        assert_eq!(config.strategy, BucketStrategy::Sorted);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert!(config.validate::<3>().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HashGridConfig::new(0.5, 8)
            .with_strategy(BucketStrategy::Lists)
            .with_metric(DistanceMetric::Periodic)
            .with_nearest_epsilon(-1.0);

        assert_eq!(config.cell_size, 0.5);
        assert_eq!(config.hash_size, 8);
        assert_eq!(config.strategy, BucketStrategy::Lists);
        assert_eq!(config.metric, DistanceMetric::Periodic);
        assert_eq!(config.nearest_epsilon, 0.0);
    }

    #[test]
    fn test_neighbor_radius() {
        let config = HashGridConfig::new(0.5, 4);
        assert_relative_eq!(config.neighbor_radius_sq(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_cell_size() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = HashGridConfig::new(bad, 4).validate::<2>();
            assert!(matches!(result, Err(HashGridError::InvalidCellSize(_))));
        }
    }

    #[test]
    fn test_validate_hash_size() {
        let result = HashGridConfig::new(1.0, 0).validate::<2>();
        assert_eq!(result, Err(HashGridError::InvalidHashSize(0)));
        assert!(HashGridConfig::new(1.0, 1).validate::<2>().is_ok());
    }

    #[test]
    fn test_validate_dimension() {
        let config = HashGridConfig::new(1.0, 4);
        assert_eq!(config.validate::<0>(), Err(HashGridError::UnsupportedDimension(0)));
        assert_eq!(config.validate::<4>(), Err(HashGridError::UnsupportedDimension(4)));
        assert!(config.validate::<1>().is_ok());
    }

    #[test]
    fn test_validate_overflow() {
        let config = HashGridConfig::new(1.0, 1 << 32);
        assert!(matches!(
            config.validate::<3>(),
            Err(HashGridError::CellTableOverflow { dimension: 3, .. })
        ));
    }

    #[test]
    fn test_validate_extent_overflow() {
        // Period 1e309 is infinite
        let config = HashGridConfig::new(1e308, 10);
        assert_eq!(
            config.validate::<1>(),
            Err(HashGridError::ExtentOverflow {
                cell_size: 1e308,
                hash_size: 10,
            })
        );

        // Period is finite but 2 * cell_size^2 is not
        let config = HashGridConfig::new(1e200, 1);
        assert!(matches!(
            config.validate::<2>(),
            Err(HashGridError::ExtentOverflow { .. })
        ));

        assert!(HashGridConfig::new(1e100, 10).validate::<3>().is_ok());
    }

    #[test]
    fn test_cell_count() {
        let config = HashGridConfig::new(1.0, 4);
        assert_eq!(config.cell_count::<2>(), Some(16));
        assert_eq!(config.cell_count::<3>(), Some(64));
    }

    #[test]
    fn test_sqr_distance_metrics() {
        let a = Point2::new(0.1, 0.1);
        let b = Point2::new(3.1, 0.1);

        let euclidean = DistanceMetric::Euclidean.sqr_distance(&a, &b, 4.0);
        assert_relative_eq!(euclidean, 9.0, epsilon = 1e-9);

        // 3.0 along x wraps to -1.0 on a period of 4.0
        let periodic = DistanceMetric::Periodic.sqr_distance(&a, &b, 4.0);
        assert_relative_eq!(periodic, 1.0, epsilon = 1e-9);
    }
}
