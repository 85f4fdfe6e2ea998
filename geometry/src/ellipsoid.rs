use nalgebra::Rotation3;
use crate::{Point, Vector};

/// Rotation angles (radians) about the first, second and third voxel axes.
pub type Angles = Vector;

/// An ellipsoid in voxel-index coordinates.
///
/// The semi-axes are given in the ellipsoid's own frame, which is rotated
/// into the voxel frame by `R = Rz(angles[2]) * Ry(angles[1]) * Rx(angles[0])`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    pub center: Point,
    pub semi_axes: Vector,
    pub angles: Angles,
}

impl Ellipsoid {

    pub fn new(center: Point, semi_axes: Vector, angles: Angles) -> Self {
        Self { center, semi_axes, angles }
    }

    /// Sphere of radius `r`, no rotation
    pub fn sphere(center: Point, r: f32) -> Self {
        Self::new(center, Vector::new(r, r, r), Angles::zeros())
    }

    pub fn rotation(&self) -> Rotation3<f32> {
        let a = &self.angles;
        Rotation3::from_euler_angles(a.x, a.y, a.z)
    }

    /// `true` if all semi-axes are finite and strictly positive, and the
    /// centre and angles are finite.
    pub fn is_well_formed(&self) -> bool {
        self.semi_axes.iter().all(|a| a.is_finite() && *a > 0.0) &&
        self.center   .iter().all(|c| c.is_finite()) &&
        self.angles   .iter().all(|a| a.is_finite())
    }

    /// Half-width of the axis-aligned box enclosing the rotated ellipsoid.
    pub fn half_extent(&self) -> Vector {
        let r = self.rotation();
        let m = r.matrix();
        Vector::from_fn(|i, _| {
            (0..3).map(|j| (m[(i, j)] * self.semi_axes[j]).powi(2))
                  .sum::<f32>()
                  .sqrt()
        })
    }

    /// Is `p` inside (or on the surface of) the ellipsoid?
    pub fn contains(&self, p: &Point) -> bool {
        self.contains_with(&self.rotation(), p)
    }

    // Lets tight loops compute the rotation once.
    pub(crate) fn contains_with(&self, rotation: &Rotation3<f32>, p: &Point) -> bool {
        let q = rotation.inverse_transform_vector(&(*p - self.center));
        q.component_div(&self.semi_axes).norm_squared() <= 1.0
    }
}
