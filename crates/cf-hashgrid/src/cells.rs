//! Cell tables: cell index to the ids of the points it holds.
//!
//! Two layouts give the same mapping:
//!
//! - `Sorted` stores a `(start, len)` range per cell into the point sequence,
//!   which the builder sorts by cell beforehand.
//! - `Lists` stores a list of point ids per cell.

use std::iter::FusedIterator;
use std::ops::Range;
use std::slice;

use crate::config::BucketStrategy;

/// A contiguous run of point ids sharing one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// First point id in the cell.
    pub start: usize,
    /// Number of points in the cell.
    pub len: usize,
}

impl CellRange {
    const fn ids(self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Occupancy summary written by a fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Occupancy {
    pub(crate) occupied: usize,
    pub(crate) max_bucket: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum CellTable {
    Sorted(Vec<CellRange>),
    Lists(Vec<Vec<usize>>),
}

impl Default for CellTable {
    fn default() -> Self {
        Self::Sorted(Vec::new())
    }
}

impl CellTable {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Sorted(ranges) => ranges.len(),
            Self::Lists(lists) => lists.len(),
        }
    }

    pub(crate) const fn strategy(&self) -> BucketStrategy {
        match self {
            Self::Sorted(_) => BucketStrategy::Sorted,
            Self::Lists(_) => BucketStrategy::Lists,
        }
    }

    /// Empties every cell for `cell_count` cells of the given layout.
    ///
    /// Storage is kept when layout and size match. Returns `true` when it was reallocated.
    pub(crate) fn reset(&mut self, strategy: BucketStrategy, cell_count: usize) -> bool {
        if self.strategy() == strategy && self.len() == cell_count {
            match self {
                Self::Sorted(ranges) => ranges.fill(CellRange::default()),
                Self::Lists(lists) => lists.iter_mut().for_each(Vec::clear),
            }
            return false;
        }

        *self = match strategy {
            BucketStrategy::Sorted => Self::Sorted(vec![CellRange::default(); cell_count]),
            BucketStrategy::Lists => Self::Lists(vec![Vec::new(); cell_count]),
        };
        true
    }

    /// Writes ranges from the cells of points already sorted by cell.
    ///
    /// Cells must be in bounds and non-decreasing; points of one cell are one run.
    pub(crate) fn fill_sorted<I>(&mut self, sorted_cells: I) -> Occupancy
    where
        I: IntoIterator<Item = usize>,
    {
        let mut occupancy = Occupancy::default();
        let Self::Sorted(ranges) = self else {
            return occupancy;
        };

        let mut current: Option<usize> = None;
        let mut range = CellRange::default();
        for (id, cell) in sorted_cells.into_iter().enumerate() {
            if current == Some(cell) {
                range.len += 1;
                continue;
            }
            if let Some(prev) = current {
                occupancy.record(range.len);
                ranges[prev] = range;
            }
            current = Some(cell);
            range = CellRange { start: id, len: 1 };
        }
        if let Some(prev) = current {
            occupancy.record(range.len);
            ranges[prev] = range;
        }
        occupancy
    }

    /// Appends every `(id, cell)` pair to its cell's list.
    pub(crate) fn fill_lists<I>(&mut self, assignments: I) -> Occupancy
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut occupancy = Occupancy::default();
        let Self::Lists(lists) = self else {
            return occupancy;
        };

        for (id, cell) in assignments {
            lists[cell].push(id);
        }
        for list in lists.iter().filter(|list| !list.is_empty()) {
            occupancy.record(list.len());
        }
        occupancy
    }

    /// Point ids held by `cell`; empty for out-of-range cells.
    pub(crate) fn bucket(&self, cell: usize) -> Bucket<'_> {
        match self {
            Self::Sorted(ranges) => {
                Bucket::Range(ranges.get(cell).copied().unwrap_or_default().ids())
            }
            Self::Lists(lists) => {
                Bucket::List(lists.get(cell).map(Vec::as_slice).unwrap_or_default().iter())
            }
        }
    }
}

impl Occupancy {
    fn record(&mut self, len: usize) {
        self.occupied += 1;
        self.max_bucket = self.max_bucket.max(len);
    }
}

/// Iterator over the point ids of one cell.
#[derive(Debug, Clone)]
pub enum Bucket<'a> {
    /// Ids of a sorted-layout cell.
    Range(Range<usize>),
    /// Ids of a list-layout cell.
    List(slice::Iter<'a, usize>),
}

impl Default for Bucket<'_> {
    fn default() -> Self {
        Self::Range(0..0)
    }
}

impl Iterator for Bucket<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Self::Range(range) => range.next(),
            Self::List(iter) => iter.next().copied(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Range(range) => range.size_hint(),
            Self::List(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for Bucket<'_> {}

impl FusedIterator for Bucket<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_reuses_storage() {
        let mut table = CellTable::default();
        assert!(table.reset(BucketStrategy::Sorted, 16));
        assert!(!table.reset(BucketStrategy::Sorted, 16));
        assert!(table.reset(BucketStrategy::Sorted, 9));
        assert!(table.reset(BucketStrategy::Lists, 9));
        assert!(!table.reset(BucketStrategy::Lists, 9));
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn test_fill_sorted_runs() {
        let mut table = CellTable::default();
        table.reset(BucketStrategy::Sorted, 8);
        let occupancy = table.fill_sorted([1, 1, 4, 6, 6, 6]);

        assert_eq!(occupancy.occupied, 3);
        assert_eq!(occupancy.max_bucket, 3);
        assert_eq!(table.bucket(1).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(table.bucket(4).collect::<Vec<_>>(), vec![2]);
        assert_eq!(table.bucket(6).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(table.bucket(0).count(), 0);
        assert_eq!(table.bucket(7).count(), 0);
    }

    #[test]
    fn test_fill_lists() {
        let mut table = CellTable::default();
        table.reset(BucketStrategy::Lists, 4);
        let occupancy = table.fill_lists([(0, 3), (1, 0), (2, 3)]);

        assert_eq!(occupancy.occupied, 2);
        assert_eq!(occupancy.max_bucket, 2);
        assert_eq!(table.bucket(3).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(table.bucket(0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_reset_clears_previous_fill() {
        let mut table = CellTable::default();
        table.reset(BucketStrategy::Sorted, 4);
        table.fill_sorted([2, 2]);
        table.reset(BucketStrategy::Sorted, 4);
        assert_eq!(table.bucket(2).count(), 0);

        table.reset(BucketStrategy::Lists, 4);
        table.fill_lists([(0, 1)]);
        table.reset(BucketStrategy::Lists, 4);
        assert_eq!(table.bucket(1).count(), 0);
    }

    #[test]
    fn test_out_of_range_bucket_is_empty() {
        let table = CellTable::default();
        assert_eq!(table.bucket(100).count(), 0);
        assert_eq!(Bucket::default().len(), 0);
    }

    #[test]
    fn test_empty_fill() {
        let mut table = CellTable::default();
        table.reset(BucketStrategy::Sorted, 4);
        let occupancy = table.fill_sorted(std::iter::empty());
        assert_eq!(occupancy, Occupancy::default());
    }
}
