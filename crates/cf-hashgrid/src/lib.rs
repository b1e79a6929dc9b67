//! Periodic uniform spatial hash grid for CortenForge.
//!
//! This crate buckets moving points into a fixed-size, toroidally wrapped cell table and
//! answers fixed-radius neighbor and nearest-point queries against it:
//!
//! - [`HashGrid`] - Point registry, build, and queries (with [`HashGrid2`] / [`HashGrid3`] aliases)
//! - [`HashGridConfig`] - Cell size, hash size, bucketing strategy, and distance metric
//! - [`CellHasher`] - Position to cell index mapping with periodic wrapping
//! - [`PositionSource`] - Supplies world positions of handles at build time
//! - [`LocalFrame`] - Maps world space into the grid's local space
//! - [`Neighbor`] and [`Neighbors`] - Query results
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Points are identified by
//! caller-owned handles; the grid never owns the objects behind them.
//!
//! # Periodicity
//!
//! Each axis has `hash_size` cells of width `cell_size`. Cell coordinates wrap modulo
//! `hash_size`, so positions that differ by a multiple of `hash_size * cell_size` along an
//! axis land in the same cell. Distances use [`DistanceMetric::Euclidean`] by default, which
//! keeps wrapped-in far-away points out of results; [`DistanceMetric::Periodic`] measures
//! the minimum-image distance instead.
//!
//! # Example
//!
//! ```
//! use cf_hashgrid::{HashGrid, HashGrid2, HashGridConfig};
//! use nalgebra::Point2;
//!
//! let positions = vec![
//!     Point2::new(0.1, 0.1),
//!     Point2::new(0.9, 0.9),
//!     Point2::new(3.1, 0.1),
//! ];
//!
//! let mut grid: HashGrid2<usize> = HashGrid::new(HashGridConfig::new(1.0, 4));
//! for handle in 0..positions.len() {
//!     grid.add(handle);
//! }
//! grid.build(&|handle: &usize| positions[*handle]).unwrap();
//!
//! // Radius is sqrt(2) * cell_size; the wrapped point at x = 3.1 is too far away
//! let near: Vec<usize> = grid
//!     .find_neighbors_of_handle(&0)
//!     .unwrap()
//!     .map(|n| *n.handle)
//!     .collect();
//! assert_eq!(near, vec![1]);
//! ```
//!
//! # Bucketing Strategies
//!
//! ```
//! use cf_hashgrid::{BucketStrategy, DistanceMetric, HashGrid, HashGrid3, HashGridConfig};
//! use nalgebra::Point3;
//!
//! let config = HashGridConfig::new(0.5, 32)
//!     .with_strategy(BucketStrategy::Lists)
//!     .with_metric(DistanceMetric::Periodic);
//!
//! let mut grid: HashGrid3<&str> = HashGrid::new(config);
//! grid.add("a");
//! grid.add("b");
//!
//! let stats = grid
//!     .build(&|name: &&str| match *name {
//!         "a" => Point3::new(0.1, 0.1, 0.1),
//!         _ => Point3::new(15.9, 0.1, 0.1),
//!     })
//!     .unwrap();
//! assert_eq!(stats.occupied_cells, 2);
//!
//! // Under the periodic metric the two points are 0.2 apart across the boundary
//! let nearest = grid.nearest_to_handle(&"a").unwrap().unwrap();
//! assert_eq!(*nearest.handle, "b");
//! assert!((nearest.distance() - 0.2).abs() < 1e-9);
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cells;
mod config;
mod error;
mod frame;
mod grid;
mod hasher;
mod query;
mod registry;
mod source;

// Re-export core types
pub use cells::Bucket;
pub use config::{BucketStrategy, DistanceMetric, HashGridConfig, MAX_DIMENSION};
pub use error::{HashGridError, HashGridResult};
pub use frame::{IdentityFrame, LocalFrame};
pub use grid::{BuildState, BuildStats, HashGrid, HashGrid2, HashGrid3};
pub use hasher::{CellHasher, CellRing};
pub use query::{Neighbor, Neighbors};
pub use registry::PointRecord;
pub use source::PositionSource;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point, Point2, Point3};
