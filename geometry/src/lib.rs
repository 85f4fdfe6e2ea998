//! Ellipsoid shape descriptors and their rasterization onto voxel grids.

mod ellipsoid;
mod raster;

pub use ellipsoid::{Ellipsoid, Angles};
pub use raster::{rasterize_ellipsoid, bounding_box, Shape3};

pub use nalgebra::{Point3, Vector3};

pub type Point  = Point3 <f32>;
pub type Vector = Vector3<f32>;
