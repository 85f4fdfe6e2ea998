//! The seam between phantom synthesis and whatever turns an ellipsoid into
//! voxels.

use geometry::{Ellipsoid, rasterize_ellipsoid};

use crate::{Error, Result, types::{Shape3, Volume}};

/// Turns an ellipsoid description into a dense occupancy field of the given
/// shape, with values in `[0, 1]`.
///
/// Implementations must be pure: the same inputs always produce the same
/// field.
pub trait Rasterizer {
    fn rasterize(&self, shape: Shape3, ellipsoid: &Ellipsoid) -> Result<Volume>;
}

/// Binary voxel rasterizer: `1` inside the ellipsoid, `0` outside.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoxelRasterizer;

impl Rasterizer for VoxelRasterizer {
    fn rasterize(&self, shape: Shape3, ellipsoid: &Ellipsoid) -> Result<Volume> {
        Ok(rasterize_ellipsoid(shape, ellipsoid))
    }
}

impl<F> Rasterizer for F
where
    F: Fn(Shape3, &Ellipsoid) -> Volume,
{
    fn rasterize(&self, shape: Shape3, ellipsoid: &Ellipsoid) -> Result<Volume> {
        Ok(self(shape, ellipsoid))
    }
}

/// Rasterize and check that the field has the requested shape and that every
/// value lies in `[0, 1]`.
pub(crate) fn checked<R: Rasterizer + ?Sized>(rasterizer: &R, shape: Shape3, ellipsoid: &Ellipsoid) -> Result<Volume> {
    let field = rasterizer.rasterize(shape, ellipsoid)?;
    if field.shape() != shape {
        return Err(Error::Rasterizer(format!(
            "requested field of shape {shape:?}, got {:?}", field.shape()
        )))
    }
    if let Some(v) = field.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(Error::Rasterizer(format!("field value {v} outside [0, 1]")))
    }
    Ok(field)
}

#[cfg(test)]
mod test_rasterizer {
    use super::*;
    use geometry::Point;
    use rstest::rstest;

    #[test]
    fn closures_are_rasterizers() {
        let constant = |shape: Shape3, _: &Ellipsoid| Volume::from_elem(shape, 0.25);
        let field = checked(&constant, [2, 3, 4], &Ellipsoid::sphere(Point::origin(), 1.0)).unwrap();
        assert_eq!(field.shape(), &[2, 3, 4]);
        assert!(field.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn wrong_shape_is_reported() {
        let sloppy = |_: Shape3, _: &Ellipsoid| Volume::zeros([1, 1, 1]);
        let result = checked(&sloppy, [2, 2, 2], &Ellipsoid::sphere(Point::origin(), 1.0));
        assert!(matches!(result, Err(Error::Rasterizer(_))));
    }

    #[rstest(value, case(f32::INFINITY), case(f32::NAN), case(-0.5), case(1.5))]
    fn out_of_range_values_are_reported(value: f32) {
        let wild = move |shape: Shape3, _: &Ellipsoid| {
            let mut field = Volume::zeros(shape);
            field[[1, 0, 1]] = value;
            field
        };
        let result = checked(&wild, [2, 2, 2], &Ellipsoid::sphere(Point::origin(), 1.0));
        assert!(matches!(result, Err(Error::Rasterizer(_))), "{result:?}");
    }

    #[test]
    fn voxel_rasterizer_matches_geometry() {
        let e = Ellipsoid::sphere(Point::new(3.0, 3.0, 3.0), 2.0);
        let field = VoxelRasterizer.rasterize([7, 7, 7], &e).unwrap();
        assert_eq!(field, rasterize_ellipsoid([7, 7, 7], &e));
    }
}
