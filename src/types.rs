use ndarray::{Array3, Array4};

pub use geometry::Shape3;

/// Scalar intensity field with axes `(H, W, D)`
pub type Volume = Array3<f32>;

/// Projection measurements with axes `(angle, detector row, detector column)`
pub type Sinogram = Array3<f32>;

/// Stack of volumes with axes `(sample, H, W, D)`
pub type Dataset = Array4<f32>;

pub type Point  = geometry::Point;
pub type Vector = geometry::Vector;
