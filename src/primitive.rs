//! The drawable shapes of a phantom, and how each is randomly parameterized.
//!
//! Every variant is an ellipsoid in disguise: `Primitive::shape` projects it
//! onto the common `Ellipsoid` descriptor which is handed to the rasterizer.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::Deserialize;

use geometry::{Angles, Ellipsoid};

use crate::types::{Point, Shape3, Vector};

/// Opacity of points and line segments
pub const SOLID_OPACITY: f32 = 0.9;

/// Upper bound (exclusive) of ellipsoid opacities
pub const MAX_ELLIPSOID_OPACITY: f32 = 0.9;

/// Ellipsoid semi-axes are drawn from `[base, ELLIPSOID_AXES_FACTOR * base)`
pub const ELLIPSOID_AXES_FACTOR: usize = 3;

/// Concentric semi-axes are drawn from `[base, CONCENTRIC_AXES_FACTOR * base)`
pub const CONCENTRIC_AXES_FACTOR: usize = 2;

/// Line lengths are drawn from `[base, LINE_LENGTH_FACTOR * base)`
pub const LINE_LENGTH_FACTOR: usize = 2;

/// Rotation angles are drawn from whole degrees in `[0, MAX_ANGLE_DEGREES)`
pub const MAX_ANGLE_DEGREES: u32 = 90;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Ellipsoid           { center: Point, semi_axes: Vector, rotation: Angles, opacity: f32 },
    Point               { center: Point, radius: f32 },
    Line                { center: Point, length: f32, rotation: Angles },
    ConcentricEllipsoid { center: Point, semi_axes: Vector, rotation: Angles, opacity: f32 },
}

impl Primitive {

    /// The ellipsoid which the rasterizer should draw for this primitive
    pub fn shape(&self) -> Ellipsoid {
        match *self {
            Self::Ellipsoid           { center, semi_axes, rotation, .. } |
            Self::ConcentricEllipsoid { center, semi_axes, rotation, .. } => Ellipsoid::new(center, semi_axes, rotation),
            Self::Point { center, radius }                                => Ellipsoid::sphere(center, radius),
            Self::Line  { center, length, rotation }                      => Ellipsoid::new(center, Vector::new(1.0, length, 1.0), rotation),
        }
    }

    pub fn opacity(&self) -> f32 {
        match *self {
            Self::Ellipsoid { opacity, .. } | Self::ConcentricEllipsoid { opacity, .. } => opacity,
            Self::Point { .. } | Self::Line { .. } => SOLID_OPACITY,
        }
    }

    pub fn center(&self) -> Point {
        match *self {
            Self::Ellipsoid { center, .. } | Self::ConcentricEllipsoid { center, .. } |
            Self::Point     { center, .. } | Self::Line                { center, .. } => center,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ellipsoid           { .. } => "ellipsoid",
            Self::Point               { .. } => "point",
            Self::Line                { .. } => "line",
            Self::ConcentricEllipsoid { .. } => "concentric ellipsoid",
        }
    }
}

/// Which axes a line segment may be rotated about
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineRotation {
    /// Rotate about the first axis only
    #[default]
    SingleAxis,
    /// Rotate independently about all three axes
    AllAxes,
}

// ----- Sampling ------------------------------------------------------------------------------

/// Random centre in `[margin, dim - margin)` along each axis.
/// The caller guarantees that these ranges are not empty.
pub fn draw_center<R: Rng + ?Sized>(rng: &mut R, shape: Shape3, margin: Shape3) -> Point {
    let mut coord = |axis: usize| rng.gen_range(margin[axis]..shape[axis] - margin[axis]) as f32;
    Point::new(coord(0), coord(1), coord(2))
}

/// Random whole-degree angle in `[0°, 90°)` about each axis, in radians.
pub fn draw_rotation<R: Rng + ?Sized>(rng: &mut R) -> Angles {
    let mut angle = || (rng.gen_range(0..MAX_ANGLE_DEGREES) as f32).to_radians();
    Angles::new(angle(), angle(), angle())
}

/// Random semi-axes in `[base, factor * base)` along each axis
fn draw_semi_axes<R: Rng + ?Sized>(rng: &mut R, base: Shape3, factor: usize) -> Vector {
    let mut axis = |i: usize| rng.gen_range(base[i]..factor * base[i]) as f32;
    Vector::new(axis(0), axis(1), axis(2))
}

pub fn draw_ellipsoid<R: Rng + ?Sized>(rng: &mut R, shape: Shape3, margin: Shape3, axes: Shape3) -> Primitive {
    let center    = draw_center(rng, shape, margin);
    let semi_axes = draw_semi_axes(rng, axes, ELLIPSOID_AXES_FACTOR);
    let rotation  = draw_rotation(rng);
    let opacity   = rng.gen::<f32>() * MAX_ELLIPSOID_OPACITY;
    Primitive::Ellipsoid { center, semi_axes, rotation, opacity }
}

pub fn draw_point<R: Rng + ?Sized>(rng: &mut R, shape: Shape3, margin: Shape3, radius: RangeInclusive<usize>) -> Primitive {
    let radius = rng.gen_range(radius) as f32;
    let center = draw_center(rng, shape, margin);
    Primitive::Point { center, radius }
}

pub fn draw_line<R: Rng + ?Sized>(
    rng: &mut R,
    shape: Shape3,
    margin: Shape3,
    length: usize,
    rotate: LineRotation,
) -> Primitive {
    let center = draw_center(rng, shape, margin);
    let length = rng.gen_range(length..LINE_LENGTH_FACTOR * length) as f32;
    let rotation = match rotate {
        LineRotation::SingleAxis => {
            let angle = (rng.gen_range(0..MAX_ANGLE_DEGREES) as f32).to_radians();
            Angles::new(angle, 0.0, 0.0)
        }
        LineRotation::AllAxes => draw_rotation(rng),
    };
    Primitive::Line { center, length, rotation }
}

/// Draw the `index`-th concentric ellipsoid, anchored at `anchors[index]`.
///
/// Returns `None` if there is no such anchor.
pub fn draw_concentric<R: Rng + ?Sized>(rng: &mut R, anchors: &[Point], index: usize, axes: Shape3) -> Option<Primitive> {
    let center    = *anchors.get(index)?;
    let semi_axes = draw_semi_axes(rng, axes, CONCENTRIC_AXES_FACTOR);
    let rotation  = draw_rotation(rng);
    let opacity   = (rng.gen::<f32>() + 1.0) * 0.5;
    Some(Primitive::ConcentricEllipsoid { center, semi_axes, rotation, opacity })
}
