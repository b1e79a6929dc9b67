//! Local coordinate frames.
//!
//! Positions arrive in world space and are bucketed in the grid's local space. A
//! [`LocalFrame`] converts between the two; the grid calls it once per point per build.
//!
//! # Example
//!
//! ```
//! use cf_hashgrid::LocalFrame;
//! use nalgebra::{Isometry2, Point2, Vector2};
//!
//! // Local space sits at (10, 0) in the world
//! let frame = Isometry2::new(Vector2::new(10.0, 0.0), 0.0);
//! let local = frame.world_to_local(&Point2::new(11.0, 2.0));
//! assert!((local - Point2::new(1.0, 2.0)).norm() < 1e-12);
//! ```

use nalgebra::{AbstractRotation, Isometry, Point, Translation};

/// Converts points between world space and grid-local space.
pub trait LocalFrame<const D: usize> {
    /// Maps a world-space point into local space.
    fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D>;

    /// Maps a local-space point back into world space.
    fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D>;
}

/// Local space equals world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IdentityFrame;

impl<const D: usize> LocalFrame<D> for IdentityFrame {
    fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D> {
        *world
    }

    fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D> {
        *local
    }
}

/// The isometry is the pose of local space in the world.
impl<R, const D: usize> LocalFrame<D> for Isometry<f64, R, D>
where
    R: AbstractRotation<f64, D>,
{
    fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D> {
        self.inverse_transform_point(world)
    }

    fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D> {
        self.transform_point(local)
    }
}

/// The translation is the offset of local space in the world.
impl<const D: usize> LocalFrame<D> for Translation<f64, D> {
    fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D> {
        self.inverse_transform_point(world)
    }

    fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D> {
        self.transform_point(local)
    }
}

impl<T, const D: usize> LocalFrame<D> for Box<T>
where
    T: LocalFrame<D> + ?Sized,
{
    fn world_to_local(&self, world: &Point<f64, D>) -> Point<f64, D> {
        (**self).world_to_local(world)
    }

    fn local_to_world(&self, local: &Point<f64, D>) -> Point<f64, D> {
        (**self).local_to_world(local)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use nalgebra::{Isometry2, Isometry3, Point2, Point3, Translation3, Vector2, Vector3};

    use super::*;

    #[test]
    fn test_identity_frame() {
        let p = Point3::new(1.0, -2.0, 3.0);
        assert_eq!(IdentityFrame.world_to_local(&p), p);
        assert_eq!(IdentityFrame.local_to_world(&p), p);
    }

    #[test]
    fn test_isometry_rotation() {
        // Local space rotated a quarter turn counter-clockwise
        let frame = Isometry2::new(Vector2::zeros(), FRAC_PI_2);
        let local = frame.world_to_local(&Point2::new(0.0, 1.0));
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_isometry_roundtrip() {
        let frame = Isometry3::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.3, -0.2, 0.9));
        let world = Point3::new(-4.0, 0.5, 7.25);
        let back = frame.local_to_world(&frame.world_to_local(&world));
        assert_relative_eq!(back, world, epsilon = 1e-10);
    }

    #[test]
    fn test_translation_frame() {
        let frame = Translation3::new(1.0, 1.0, 1.0);
        let local = frame.world_to_local(&Point3::new(1.5, 2.0, 0.0));
        assert_relative_eq!(local, Point3::new(0.5, 1.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_boxed_frame() {
        let frame: Box<dyn LocalFrame<3>> = Box::new(Translation3::new(0.0, 0.0, 2.0));
        let local = frame.world_to_local(&Point3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(local, Point3::origin(), epsilon = 1e-12);
    }
}
