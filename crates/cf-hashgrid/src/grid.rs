//! The hash grid: registration, build, and cached-state accessors.

use std::hash::Hash;

use nalgebra::Point;
use tracing::{debug, warn};

use crate::cells::{Bucket, CellTable};
use crate::config::{BucketStrategy, DistanceMetric, HashGridConfig};
use crate::error::{HashGridError, HashGridResult};
use crate::frame::{IdentityFrame, LocalFrame};
use crate::hasher::CellHasher;
use crate::registry::{PointRecord, PointRegistry};
use crate::source::PositionSource;

/// Lifecycle state of a [`HashGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    /// No build has succeeded yet.
    Unbuilt,
    /// The cell table matches the registered points.
    Fresh,
    /// Points were added or cleared after the last build.
    Stale,
}

/// Summary of one [`HashGrid::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of points bucketed.
    pub points: usize,
    /// Number of cells in the table.
    pub cells: usize,
    /// Number of cells holding at least one point.
    pub occupied_cells: usize,
    /// Largest number of points in one cell.
    pub max_bucket: usize,
    /// Whether the cell table storage had to be reallocated.
    pub reallocated: bool,
}

/// Parameters frozen by the last successful build. Queries read only these, so a
/// replaced configuration takes effect at the next build.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout<const D: usize> {
    pub(crate) hasher: CellHasher<D>,
    pub(crate) metric: DistanceMetric,
    pub(crate) radius_sq: f64,
    pub(crate) nearest_epsilon: f64,
}

impl<const D: usize> Layout<D> {
    fn new(hasher: CellHasher<D>, config: &HashGridConfig) -> Self {
        Self {
            hasher,
            metric: config.metric,
            radius_sq: config.neighbor_radius_sq(),
            nearest_epsilon: config.nearest_epsilon.max(0.0),
        }
    }

    pub(crate) fn sqr_distance(&self, a: &Point<f64, D>, b: &Point<f64, D>) -> f64 {
        self.metric.sqr_distance(a, b, self.hasher.period())
    }
}

/// A periodic uniform hash grid over points in `D` dimensions.
///
/// Points are registered by handle with [`add`](Self::add). [`build`](Self::build) reads
/// every handle's world position from a [`PositionSource`], maps it into local space with
/// the grid's [`LocalFrame`], and buckets it into a `hash_size^D` cell table whose axes wrap.
/// Queries then walk the 3^D cells around a position.
///
/// A point's id is its index in the registered sequence. Ids are only stable between builds:
/// with [`BucketStrategy::Sorted`] a build reorders points by cell. Use handles to identify
/// points across builds.
///
/// # Example
///
/// ```
/// use cf_hashgrid::{HashGrid, HashGrid2, HashGridConfig};
/// use nalgebra::Point2;
///
/// let positions = vec![
///     Point2::new(0.1, 0.1),
///     Point2::new(0.9, 0.9),
///     Point2::new(5.0, 5.0),
/// ];
///
/// let mut grid: HashGrid2<usize> = HashGrid::new(HashGridConfig::new(1.0, 16));
/// for handle in 0..positions.len() {
///     grid.add(handle);
/// }
/// grid.build(&|handle: &usize| positions[*handle]).unwrap();
///
/// let near: Vec<usize> = grid
///     .find_neighbors(&Point2::new(0.2, 0.2))
///     .unwrap()
///     .map(|n| *n.handle)
///     .collect();
/// assert_eq!(near.len(), 2);
///
/// let nearest = grid.nearest_to_handle(&0).unwrap().unwrap();
/// assert_eq!(*nearest.handle, 1);
/// ```
#[derive(Debug, Clone)]
pub struct HashGrid<H, const D: usize, F = IdentityFrame> {
    config: HashGridConfig,
    frame: F,
    registry: PointRegistry<H, D>,
    cells: CellTable,
    layout: Option<Layout<D>>,
    stale: bool,
}

/// A two-dimensional hash grid.
pub type HashGrid2<H, F = IdentityFrame> = HashGrid<H, 2, F>;

/// A three-dimensional hash grid.
pub type HashGrid3<H, F = IdentityFrame> = HashGrid<H, 3, F>;

impl<H, const D: usize> HashGrid<H, D> {
    /// Creates an empty grid whose local space is world space.
    #[must_use]
    pub fn new(config: HashGridConfig) -> Self {
        Self::with_frame(config, IdentityFrame)
    }

    /// Creates an empty grid with room for `capacity` points.
    #[must_use]
    pub fn with_capacity(config: HashGridConfig, capacity: usize) -> Self {
        let mut grid = Self::new(config);
        grid.reserve(capacity);
        grid
    }
}

impl<H, const D: usize> Default for HashGrid<H, D> {
    fn default() -> Self {
        Self::new(HashGridConfig::default())
    }
}

impl<H, const D: usize, F> HashGrid<H, D, F> {
    /// Creates an empty grid with a custom local frame.
    #[must_use]
    pub fn with_frame(config: HashGridConfig, frame: F) -> Self {
        Self {
            config,
            frame,
            registry: PointRegistry::default(),
            cells: CellTable::default(),
            layout: None,
            stale: false,
        }
    }

    /// The configuration the next build will use.
    #[must_use]
    pub const fn config(&self) -> &HashGridConfig {
        &self.config
    }

    /// Replaces the configuration. It is validated and applied by the next build; until
    /// then queries keep using the configuration of the last successful build.
    pub fn set_config(&mut self, config: HashGridConfig) {
        self.config = config;
    }

    /// The local frame.
    #[must_use]
    pub const fn frame(&self) -> &F {
        &self.frame
    }

    /// Replaces the local frame. Cached positions keep the old frame until the next build.
    pub fn set_frame(&mut self, frame: F) {
        self.frame = frame;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BuildState {
        match (&self.layout, self.stale) {
            (None, _) => BuildState::Unbuilt,
            (Some(_), true) => BuildState::Stale,
            (Some(_), false) => BuildState::Fresh,
        }
    }

    /// Registers a point and returns its slot index. The grid becomes stale.
    pub fn add(&mut self, handle: H) -> usize {
        self.stale = true;
        self.registry.add(handle)
    }

    /// Removes every point. The grid becomes stale.
    pub fn clear(&mut self) {
        self.stale = true;
        self.registry.clear();
    }

    /// Reserves room for `additional` more points.
    pub fn reserve(&mut self, additional: usize) {
        self.registry.reserve(additional);
    }

    /// Number of registered points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no points are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Handle of the point with id `id`, in any state.
    #[must_use]
    pub fn handle(&self, id: usize) -> Option<&H> {
        self.registry.get(id).map(|record| &record.handle)
    }

    /// Local-space position of `id` cached by the last build.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh,
    /// [`HashGridError::UnknownPoint`] if `id` is out of range.
    pub fn position(&self, id: usize) -> HashGridResult<Point<f64, D>> {
        self.record(id).map(|record| record.position)
    }

    /// Cell index of `id` computed by the last build.
    ///
    /// # Errors
    ///
    /// Same as [`position`](Self::position).
    pub fn cell_of(&self, id: usize) -> HashGridResult<usize> {
        self.record(id).map(|record| record.cell)
    }

    /// All point records, indexed by id.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh.
    pub fn records(&self) -> HashGridResult<&[PointRecord<H, D>]> {
        self.layout()?;
        Ok(self.registry.records())
    }

    /// Number of cells in the table of the last build (0 before the first build).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Ids of the points in `cell`. Out-of-range cells are empty.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh.
    pub fn cell_members(&self, cell: usize) -> HashGridResult<Bucket<'_>> {
        self.layout()?;
        Ok(self.cells.bucket(cell))
    }

    fn record(&self, id: usize) -> HashGridResult<&PointRecord<H, D>> {
        self.layout()?;
        self.registry.get(id).ok_or(HashGridError::UnknownPoint(id))
    }

    pub(crate) fn layout(&self) -> HashGridResult<&Layout<D>> {
        match &self.layout {
            None => Err(HashGridError::NotBuilt),
            Some(_) if self.stale => Err(HashGridError::Stale),
            Some(layout) => Ok(layout),
        }
    }

    pub(crate) const fn registry(&self) -> &PointRegistry<H, D> {
        &self.registry
    }

    pub(crate) const fn cells(&self) -> &CellTable {
        &self.cells
    }
}

impl<H, const D: usize, F> HashGrid<H, D, F>
where
    F: LocalFrame<D>,
{
    /// Maps a world-space point into the grid's local space.
    #[must_use]
    pub fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D> {
        self.frame.world_to_local(world)
    }

    /// Maps a local-space point back into world space.
    #[must_use]
    pub fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D> {
        self.frame.local_to_world(local)
    }

    /// Rebuilds the cell table from the current position of every registered point.
    ///
    /// The configuration is validated first; on error nothing is modified, so a previously
    /// fresh grid stays queryable. With [`BucketStrategy::Sorted`] point ids are permuted.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from [`HashGridConfig::validate`].
    pub fn build<S>(&mut self, source: &S) -> HashGridResult<BuildStats>
    where
        S: PositionSource<H, D> + ?Sized,
    {
        let hasher = CellHasher::<D>::from_config(&self.config)?;
        let cell_count = hasher.cell_count();
        let strategy = self.config.strategy;

        let mut non_finite = 0_usize;
        for record in self.registry.records_mut() {
            let local = self
                .frame
                .world_to_local(&source.world_position(&record.handle));
            if !local.coords.iter().all(|c| c.is_finite()) {
                non_finite += 1;
            }
            record.cell = hasher.hash_point(&local);
            record.position = local;
        }
        if non_finite > 0 {
            warn!(count = non_finite, "Non-finite positions in hash grid build");
        }

        let reallocated = self.cells.reset(strategy, cell_count);
        if reallocated {
            debug!(cells = cell_count, ?strategy, "Allocated cell table");
        }

        let occupancy = match strategy {
            BucketStrategy::Sorted => {
                self.registry.sort_by_cell();
                self.cells
                    .fill_sorted(self.registry.records().iter().map(|record| record.cell))
            }
            BucketStrategy::Lists => self.cells.fill_lists(
                self.registry
                    .records()
                    .iter()
                    .enumerate()
                    .map(|(id, record)| (id, record.cell)),
            ),
        };

        self.layout = Some(Layout::new(hasher, &self.config));
        self.stale = false;

        let stats = BuildStats {
            points: self.registry.len(),
            cells: cell_count,
            occupied_cells: occupancy.occupied,
            max_bucket: occupancy.max_bucket,
            reallocated,
        };
        debug!(
            points = stats.points,
            occupied = stats.occupied_cells,
            max_bucket = stats.max_bucket,
            "Built hash grid"
        );
        Ok(stats)
    }
}

impl<H, const D: usize, F> HashGrid<H, D, F>
where
    H: Clone + Eq + Hash,
{
    /// Current id of `handle`, or `None` if it is not registered.
    ///
    /// # Errors
    ///
    /// [`HashGridError::NotBuilt`] or [`HashGridError::Stale`] unless the grid is fresh.
    pub fn id_of(&self, handle: &H) -> HashGridResult<Option<usize>> {
        self.layout()?;
        Ok(self.registry.lookup().get(handle).copied())
    }
}
