//! Registered points and their per-build cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::OnceLock;

use nalgebra::Point;

/// A registered point: the caller's handle plus the state cached by the last build.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord<H, const D: usize> {
    /// Caller-owned identity of the point.
    pub handle: H,
    /// Local-space position at the last build.
    pub position: Point<f64, D>,
    /// Cell index at the last build.
    pub cell: usize,
}

impl<H, const D: usize> PointRecord<H, D> {
    fn new(handle: H) -> Self {
        Self {
            handle,
            position: Point::origin(),
            cell: 0,
        }
    }
}

/// Ordered sequence of points; a point's index is its id until the next build.
#[derive(Debug, Clone)]
pub(crate) struct PointRegistry<H, const D: usize> {
    records: Vec<PointRecord<H, D>>,
    lookup: OnceLock<HashMap<H, usize>>,
}

impl<H, const D: usize> Default for PointRegistry<H, D> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            lookup: OnceLock::new(),
        }
    }
}

impl<H, const D: usize> PointRegistry<H, D> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            lookup: OnceLock::new(),
        }
    }

    pub(crate) fn add(&mut self, handle: H) -> usize {
        self.lookup.take();
        self.records.push(PointRecord::new(handle));
        self.records.len() - 1
    }

    pub(crate) fn clear(&mut self) {
        self.lookup.take();
        self.records.clear();
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.records.reserve(additional);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn get(&self, id: usize) -> Option<&PointRecord<H, D>> {
        self.records.get(id)
    }

    pub(crate) fn records(&self) -> &[PointRecord<H, D>] {
        &self.records
    }

    /// Mutable access for the builder. Drops the handle lookup since ids may move.
    pub(crate) fn records_mut(&mut self) -> &mut [PointRecord<H, D>] {
        self.lookup.take();
        &mut self.records
    }

    /// Stable sort by cell so each cell's points are contiguous.
    pub(crate) fn sort_by_cell(&mut self) {
        self.lookup.take();
        self.records.sort_by_key(|record| record.cell);
    }
}

impl<H, const D: usize> PointRegistry<H, D>
where
    H: Clone + Eq + Hash,
{
    /// Handle to id map, built on first use after any mutation.
    ///
    /// When a handle was added more than once, the highest id wins.
    pub(crate) fn lookup(&self) -> &HashMap<H, usize> {
        self.lookup.get_or_init(|| {
            self.records
                .iter()
                .enumerate()
                .map(|(id, record)| (record.handle.clone(), id))
                .collect()
        })
    }
}
