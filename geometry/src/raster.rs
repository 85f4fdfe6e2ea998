//! Dense voxel rasterization of ellipsoids

use std::ops::Range;

use ndarray::{s, Array3, Zip};

use crate::{Ellipsoid, Point};

/// Number of voxels along each of the three axes
pub type Shape3 = [usize; 3];

/// Voxel index ranges, clipped to `shape`, that can possibly intersect `e`.
/// Any of the ranges may be empty, when `e` lies entirely outside the grid.
pub fn bounding_box(shape: Shape3, e: &Ellipsoid) -> [Range<usize>; 3] {
    let h = e.half_extent();
    let range = |axis: usize| {
        let lo = (e.center[axis] - h[axis]).floor().max(0.0);
        let hi = (e.center[axis] + h[axis]).ceil() + 1.0;
        let n = shape[axis] as f32;
        let (lo, hi) = (lo.min(n) as usize, hi.clamp(0.0, n) as usize);
        lo..hi.max(lo)
    };
    [range(0), range(1), range(2)]
}

/// Rasterize `e` onto a grid of `shape` voxels.
///
/// Voxel `[i, j, k]` sits at the point `(i, j, k)`. Voxels inside the
/// ellipsoid get `1.0`, all others `0.0`. Parts of the ellipsoid outside the
/// grid are simply lost.
pub fn rasterize_ellipsoid(shape: Shape3, e: &Ellipsoid) -> Array3<f32> {
    let mut field = Array3::zeros(shape);
    if !e.is_well_formed() { return field }

    let [bx, by, bz] = bounding_box(shape, e);
    let (x0, y0, z0) = (bx.start, by.start, bz.start);
    let rotation = e.rotation();
    Zip::indexed(field.slice_mut(s![bx, by, bz])).par_for_each(|(i, j, k), voxel| {
        let p = Point::new((i + x0) as f32, (j + y0) as f32, (k + z0) as f32);
        if e.contains_with(&rotation, &p) { *voxel = 1.0 }
    });
    field
}
