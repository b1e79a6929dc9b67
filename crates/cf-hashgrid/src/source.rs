//! World positions of registered handles.

use nalgebra::Point;

/// Supplies the current world-space position of a handle.
///
/// The grid never owns or mutates the objects behind its handles; it asks a source for
/// each position during [`HashGrid::build`](crate::HashGrid::build) and caches the result.
///
/// Any `Fn(&H) -> Point<f64, D>` is a source:
///
/// ```
/// use cf_hashgrid::PositionSource;
/// use nalgebra::Point2;
///
/// let bodies = vec![Point2::new(0.0, 1.0), Point2::new(2.0, 3.0)];
/// let source = |id: &usize| bodies[*id];
/// assert_eq!(source.world_position(&1), Point2::new(2.0, 3.0));
/// ```
pub trait PositionSource<H, const D: usize> {
    /// Current world-space position of `handle`.
    fn world_position(&self, handle: &H) -> Point<f64, D>;
}

impl<H, F, const D: usize> PositionSource<H, D> for F
where
    F: Fn(&H) -> Point<f64, D>,
{
    fn world_position(&self, handle: &H) -> Point<f64, D> {
        self(handle)
    }
}
