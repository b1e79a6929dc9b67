//! Fixed-radius neighbor and nearest-point queries.
//!
//! A query discretizes its position, walks the 1-ring of cells around it (3^D cells,
//! wrapped), and keeps points whose squared distance is strictly below
//! [`HashGridConfig::neighbor_radius_sq`](crate::HashGridConfig::neighbor_radius_sq).
//! Results are produced lazily and in no particular order.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;

use nalgebra::Point;

use crate::cells::{Bucket, CellTable};
use crate::error::{HashGridError, HashGridResult};
use crate::frame::LocalFrame;
use crate::grid::{HashGrid, Layout};
use crate::hasher::CellRing;
use crate::registry::PointRecord;

/// A point found by a neighbor query.
pub struct Neighbor<'a, H> {
    /// Id of the point, valid until the next build.
    pub id: usize,
    /// Squared distance from the query position.
    pub sqr_distance: f64,
    /// Handle of the point.
    pub handle: &'a H,
}

impl<H> Neighbor<'_, H> {
    /// Distance from the query position.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.sqr_distance.sqrt()
    }

    /// Total order by squared distance, for sorting results.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_hashgrid::{HashGrid, HashGrid2, HashGridConfig};
    /// use nalgebra::Point2;
    ///
    /// let positions = [Point2::new(0.9, 0.0), Point2::new(0.3, 0.0), Point2::new(0.6, 0.0)];
    /// let mut grid: HashGrid2<usize> = HashGrid::new(HashGridConfig::new(1.0, 8));
    /// for handle in 0..positions.len() {
    ///     grid.add(handle);
    /// }
    /// grid.build(&|h: &usize| positions[*h]).unwrap();
    ///
    /// let mut found: Vec<_> = grid.find_neighbors(&Point2::origin()).unwrap().collect();
    /// found.sort_by(|a, b| a.cmp_distance(b));
    /// let order: Vec<usize> = found.iter().map(|n| *n.handle).collect();
    /// assert_eq!(order, vec![1, 2, 0]);
    /// ```
    #[must_use]
    pub fn cmp_distance(&self, other: &Self) -> Ordering {
        self.sqr_distance.total_cmp(&other.sqr_distance)
    }
}

impl<H> Clone for Neighbor<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Neighbor<'_, H> {}

impl<H: fmt::Debug> fmt::Debug for Neighbor<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neighbor")
            .field("id", &self.id)
            .field("sqr_distance", &self.sqr_distance)
            .field("handle", self.handle)
            .finish()
    }
}

/// Lazy iterator over the neighbors of one query.
///
/// Borrows the grid; each call to a query method starts a new scan.
pub struct Neighbors<'a, H, const D: usize> {
    records: &'a [PointRecord<H, D>],
    cells: &'a CellTable,
    layout: Layout<D>,
    ring: CellRing,
    next_cell: usize,
    bucket: Bucket<'a>,
    center: Point<f64, D>,
    exclude: Option<usize>,
}

impl<H, const D: usize> Neighbors<'_, H, D> {
    /// Number of distinct cells this query visits.
    #[must_use]
    pub fn cells_visited(&self) -> usize {
        self.ring.len()
    }
}

impl<'a, H, const D: usize> Iterator for Neighbors<'a, H, D> {
    type Item = Neighbor<'a, H>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.bucket.next() {
                if self.exclude == Some(id) {
                    continue;
                }
                let Some(record) = self.records.get(id) else {
                    continue;
                };
                let sqr_distance = self.layout.sqr_distance(&record.position, &self.center);
                if sqr_distance < self.layout.radius_sq {
                    return Some(Neighbor {
                        id,
                        sqr_distance,
                        handle: &record.handle,
                    });
                }
                continue;
            }

            let cell = *self.ring.get(self.next_cell)?;
            self.next_cell += 1;
            self.bucket = self.cells.bucket(cell);
        }
    }
}

impl<H, const D: usize> FusedIterator for Neighbors<'_, H, D> {}

impl<H, const D: usize> fmt::Debug for Neighbors<'_, H, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neighbors")
            .field("center", &self.center)
            .field("ring", &self.ring)
            .field("next_cell", &self.next_cell)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

/// Closest neighbor strictly farther than `epsilon` (squared).
fn closest<'a, H, const D: usize>(
    neighbors: Neighbors<'a, H, D>,
    epsilon: f64,
) -> Option<Neighbor<'a, H>> {
    neighbors
        .filter(|neighbor| neighbor.sqr_distance > epsilon)
        .min_by(Neighbor::cmp_distance)
}

impl<H, const D: usize, F> HashGrid<H, D, F> {
    /// Points near a local-space position. Every registered point is a candidate,
    /// including one sitting exactly at `position`.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh.
    pub fn find_neighbors(&self, position: &Point<f64, D>) -> HashGridResult<Neighbors<'_, H, D>> {
        self.neighbors_around(*position, None)
    }

    /// Neighbors of the point `id`, at its cached position, excluding `id` itself.
    ///
    /// Other points at the same position are still reported, with distance zero.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh,
    /// [`HashGridError::UnknownPoint`] if `id` is out of range.
    pub fn find_neighbors_of(&self, id: usize) -> HashGridResult<Neighbors<'_, H, D>> {
        self.layout()?;
        let record = self
            .registry()
            .get(id)
            .ok_or(HashGridError::UnknownPoint(id))?;
        self.neighbors_around(record.position, Some(id))
    }

    /// Closest other point to `id`, ignoring candidates within the nearest epsilon.
    ///
    /// Returns `Ok(None)` when no candidate qualifies, for example for a lone point or a
    /// point whose only neighbors coincide with it.
    ///
    /// # Errors
    ///
    /// Same as [`find_neighbors_of`](Self::find_neighbors_of).
    pub fn nearest(&self, id: usize) -> HashGridResult<Option<Neighbor<'_, H>>> {
        let epsilon = self.layout()?.nearest_epsilon;
        Ok(closest(self.find_neighbors_of(id)?, epsilon))
    }

    /// Closest point to a local-space position, ignoring candidates within the nearest
    /// epsilon.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh.
    pub fn nearest_to(&self, position: &Point<f64, D>) -> HashGridResult<Option<Neighbor<'_, H>>> {
        let epsilon = self.layout()?.nearest_epsilon;
        Ok(closest(self.find_neighbors(position)?, epsilon))
    }

    fn neighbors_around(
        &self,
        center: Point<f64, D>,
        exclude: Option<usize>,
    ) -> HashGridResult<Neighbors<'_, H, D>> {
        let layout = *self.layout()?;
        Ok(Neighbors {
            records: self.registry().records(),
            cells: self.cells(),
            ring: layout.hasher.ring(&center),
            layout,
            next_cell: 0,
            bucket: Bucket::default(),
            center,
            exclude,
        })
    }
}

impl<H, const D: usize, F> HashGrid<H, D, F>
where
    F: LocalFrame<D>,
{
    /// Points near a world-space position, mapped through the grid's local frame.
    ///
    /// # Errors
    ///
    /// Same as [`find_neighbors`](Self::find_neighbors).
    pub fn find_neighbors_world(
        &self,
        world: &Point<f64, D>,
    ) -> HashGridResult<Neighbors<'_, H, D>> {
        self.find_neighbors(&self.world_to_local(world))
    }
}

impl<H, const D: usize, F> HashGrid<H, D, F>
where
    H: Clone + Eq + Hash,
{
    /// Neighbors of the point registered under `handle`, excluding that point.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh,
    /// [`HashGridError::UnknownHandle`] if `handle` is not registered.
    pub fn find_neighbors_of_handle(&self, handle: &H) -> HashGridResult<Neighbors<'_, H, D>> {
        self.find_neighbors_of(self.resolve(handle)?)
    }

    /// Closest other point to the point registered under `handle`.
    ///
    /// # Errors
    ///
    /// Same as [`find_neighbors_of_handle`](Self::find_neighbors_of_handle).
    pub fn nearest_to_handle(&self, handle: &H) -> HashGridResult<Option<Neighbor<'_, H>>> {
        self.nearest(self.resolve(handle)?)
    }

    fn resolve(&self, handle: &H) -> HashGridResult<usize> {
        self.id_of(handle)?.ok_or(HashGridError::UnknownHandle)
    }
}
