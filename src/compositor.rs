//! Assemble one phantom by drawing random primitives and merging them into an
//! accumulating volume.

use ndarray::{ArrayView3, Zip};
use rand::Rng;
use serde::Deserialize;

use crate::{
    Error, Result,
    primitive::{self, LineRotation, Primitive,
                CONCENTRIC_AXES_FACTOR, ELLIPSOID_AXES_FACTOR, LINE_LENGTH_FACTOR},
    raster::{self, Rasterizer},
    types::{Point, Shape3, Volume},
};

/// Merge `overlay` into `volume` with opacity-ordered overwrite.
///
/// Wherever the overlay's raw value is at least as large as the current
/// value, the current value is replaced by `overlay * opacity`. Elsewhere the
/// volume is left untouched. Ties go to the overlay.
pub fn blend(volume: &mut Volume, overlay: ArrayView3<f32>, opacity: f32) {
    Zip::from(volume).and(overlay).for_each(|v, &o| {
        if o >= *v { *v = o * opacity }
    });
}

/// How many primitives of one kind to draw in each sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Count {
    /// Exactly this many
    Fixed(usize),
    /// `base` plus a uniform random number in `1..=extra`
    Jittered { base: usize, extra: usize },
}

impl Count {
    pub fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> usize {
        match self {
            Count::Fixed(n) => n,
            Count::Jittered { base, extra } => base + rng.gen_range(1..=extra),
        }
    }

    fn validate(self, what: &'static str) -> Result<()> {
        match self {
            Count::Jittered { extra: 0, .. } => Err(Error::degenerate(what, "jitter range 1..=0 is empty")),
            Count::Jittered { base, extra } if base.checked_add(extra).is_none() =>
                Err(Error::degenerate(what, format!("{base} + {extra} overflows"))),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimitiveCounts {
    #[serde(default = "default_ellipsoids")] pub ellipsoids: Count,
    #[serde(default = "default_points")]     pub points:     Count,
    #[serde(default = "default_lines")]      pub lines:      Count,
    /// Number of concentric ellipsoids. If absent, a random number between 1
    /// and the number of ellipsoids. Never more than the number of ellipsoids.
    #[serde(default)]                        pub concentric: Option<usize>,
}

impl Default for PrimitiveCounts {
    fn default() -> Self {
        Self {
            ellipsoids: default_ellipsoids(),
            points:     default_points(),
            lines:      default_lines(),
            concentric: None,
        }
    }
}

impl PrimitiveCounts {
    /// Exactly the given numbers of each primitive kind
    pub fn fixed(ellipsoids: usize, points: usize, lines: usize, concentric: usize) -> Self {
        Self {
            ellipsoids: Count::Fixed(ellipsoids),
            points:     Count::Fixed(points),
            lines:      Count::Fixed(lines),
            concentric: Some(concentric),
        }
    }
}

fn default_ellipsoids() -> Count { Count::Jittered { base: 15, extra: 5 } }
fn default_points    () -> Count { Count::Jittered { base: 15, extra: 5 } }
fn default_lines     () -> Count { Count::Jittered { base:  5, extra: 5 } }

/// Everything needed to generate one sample
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleParams {
    /// Volume dimensions `(H, W, D)`
    #[serde(default = "default_shape")]
    pub shape: Shape3,

    #[serde(default)]
    pub counts: PrimitiveCounts,

    /// Centres lie in `[margin, dim - margin)` along each axis
    #[serde(default = "default_center_range")]
    pub center_range: Shape3,

    /// Ellipsoid semi-axes lie in `[base, 3 * base)`
    #[serde(default = "default_axes_range")]
    pub axes_range: Shape3,

    /// Concentric ellipsoid semi-axes lie in `[base, 2 * base)`
    #[serde(default = "default_concentric_axes_range")]
    pub concentric_axes_range: Shape3,

    /// Line semi-lengths lie in `[length_range, 2 * length_range)`
    #[serde(default = "default_length_range")]
    pub length_range: usize,

    /// Inclusive range of point radii
    #[serde(default = "default_point_radius")]
    pub point_radius: (usize, usize),

    #[serde(default)]
    pub line_rotation: LineRotation,
}

fn default_shape                () -> Shape3         { [512, 512, 32] }
fn default_center_range         () -> Shape3         { [ 30,  30,  5] }
fn default_axes_range           () -> Shape3         { [ 50,  20, 10] }
fn default_concentric_axes_range() -> Shape3         { [ 10,  10,  3] }
fn default_length_range         () -> usize          { 80 }
fn default_point_radius         () -> (usize, usize) { (3, 8) }

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            shape:                 default_shape(),
            counts:                PrimitiveCounts::default(),
            center_range:          default_center_range(),
            axes_range:            default_axes_range(),
            concentric_axes_range: default_concentric_axes_range(),
            length_range:          default_length_range(),
            point_radius:          default_point_radius(),
            line_rotation:         LineRotation::default(),
        }
    }
}

impl SampleParams {

    /// Check that the shape is non-empty and that every sampling range
    /// contains at least one value.
    pub fn validate(&self) -> Result<()> {
        let Self { shape, counts, center_range, axes_range, concentric_axes_range,
                   length_range, point_radius, .. } = self;

        if shape.iter().any(|&n| n == 0) { return Err(Error::InvalidShape(*shape)) }

        for d in 0..3 {
            let (m, n) = (center_range[d], shape[d]);
            if m.checked_mul(2).map_or(true, |both| both >= n) {
                return Err(Error::degenerate("centre", format!("axis {d}: [{m}, {n} - {m}) is empty")))
            }
        }
        // [base, factor * base) must be non-empty and representable
        let scalable = |what, base: usize, factor: usize, axis: &str| {
            if base == 0 {
                return Err(Error::degenerate(what, format!("{axis}base size is 0")))
            }
            match base.checked_mul(factor) {
                Some(_) => Ok(()),
                None    => Err(Error::degenerate(what, format!("{axis}[{base}, {factor} * {base}) overflows"))),
            }
        };
        for d in 0..3 {
            let axis = format!("axis {d}: ");
            scalable("ellipsoid semi-axes", axes_range[d], ELLIPSOID_AXES_FACTOR, &axis)?;
            scalable("concentric ellipsoid semi-axes", concentric_axes_range[d], CONCENTRIC_AXES_FACTOR, &axis)?;
        }
        scalable("line length", *length_range, LINE_LENGTH_FACTOR, "")?;

        let &(lo, hi) = point_radius;
        if lo == 0 || lo > hi {
            return Err(Error::degenerate("point radius", format!("[{lo}, {hi}] must be non-empty and positive")))
        }

        counts.ellipsoids.validate("ellipsoid count")?;
        counts.points    .validate("point count")?;
        counts.lines     .validate("line count")?;
        Ok(())
    }
}

/// How many primitives of each kind went into a sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub ellipsoids: usize,
    pub points: usize,
    pub lines: usize,
    pub concentric: usize,
}

impl Tally {
    fn count(&mut self, p: &Primitive) {
        match p {
            Primitive::Ellipsoid           { .. } => self.ellipsoids += 1,
            Primitive::Point               { .. } => self.points     += 1,
            Primitive::Line                { .. } => self.lines      += 1,
            Primitive::ConcentricEllipsoid { .. } => self.concentric += 1,
        }
    }
}

/// One finished phantom
#[derive(Clone, Debug)]
pub struct Sample {
    pub volume: Volume,
    /// Centres of the (non-concentric) ellipsoids, in drawing order
    pub ellipsoid_centers: Vec<Point>,
    pub tally: Tally,
}

/// Accumulates primitives into a volume
pub struct Compositor<'r, Z: Rasterizer + ?Sized> {
    volume: Volume,
    rasterizer: &'r Z,
    ellipsoid_centers: Vec<Point>,
    tally: Tally,
}

impl<'r, Z: Rasterizer + ?Sized> Compositor<'r, Z> {

    pub fn new(shape: Shape3, rasterizer: &'r Z) -> Result<Self> {
        if shape.iter().any(|&n| n == 0) { return Err(Error::InvalidShape(shape)) }
        Ok(Self { volume: Volume::zeros(shape), rasterizer, ellipsoid_centers: vec![], tally: Tally::default() })
    }

    pub fn shape(&self) -> Shape3 {
        let (h, w, d) = self.volume.dim();
        [h, w, d]
    }

    /// Rasterize `primitive` and merge it into the volume
    pub fn add(&mut self, primitive: &Primitive) -> Result<()> {
        let shape = primitive.shape();
        tracing::trace!(kind = primitive.kind(), ?shape, opacity = primitive.opacity(), "drawing");
        let overlay = raster::checked(self.rasterizer, self.shape(), &shape)?;
        blend(&mut self.volume, overlay.view(), primitive.opacity());
        if let Primitive::Ellipsoid { .. } = primitive {
            self.ellipsoid_centers.push(primitive.center());
        }
        self.tally.count(primitive);
        Ok(())
    }

    /// Centres of the ellipsoids added so far
    pub fn ellipsoid_centers(&self) -> &[Point] { &self.ellipsoid_centers }

    pub fn finish(self) -> Sample {
        let Self { volume, ellipsoid_centers, tally, .. } = self;
        Sample { volume, ellipsoid_centers, tally }
    }
}

/// Generate one phantom.
///
/// Primitives are drawn in the order ellipsoids, points, lines, concentric
/// ellipsoids. The `i`-th concentric ellipsoid shares its centre with the
/// `i`-th ellipsoid.
pub fn generate_sample<R, Z>(params: &SampleParams, rng: &mut R, rasterizer: &Z) -> Result<Sample>
where
    R: Rng + ?Sized,
    Z: Rasterizer + ?Sized,
{
    params.validate()?;
    let SampleParams { shape, counts, center_range: margin, axes_range, concentric_axes_range,
                       length_range, point_radius: (r_lo, r_hi), line_rotation } = *params;

    let n_ellipsoids = counts.ellipsoids.draw(rng);
    let n_points     = counts.points    .draw(rng);
    let n_lines      = counts.lines     .draw(rng);
    let n_concentric = match counts.concentric {
        None if n_ellipsoids == 0 => 0,
        None    => rng.gen_range(1..=n_ellipsoids),
        Some(n) if n > n_ellipsoids => {
            tracing::warn!(requested = n, available = n_ellipsoids, "not enough ellipsoids to anchor concentric ellipsoids");
            n_ellipsoids
        }
        Some(n) => n,
    };
    tracing::debug!(n_ellipsoids, n_points, n_lines, n_concentric, "drawing sample");

    let mut compositor = Compositor::new(shape, rasterizer)?;
    for _ in 0..n_ellipsoids {
        compositor.add(&primitive::draw_ellipsoid(rng, shape, margin, axes_range))?;
    }
    for _ in 0..n_points {
        compositor.add(&primitive::draw_point(rng, shape, margin, r_lo..=r_hi))?;
    }
    for _ in 0..n_lines {
        compositor.add(&primitive::draw_line(rng, shape, margin, length_range, line_rotation))?;
    }
    let anchors = compositor.ellipsoid_centers().to_vec();
    for i in 0..n_concentric {
        let concentric = primitive::draw_concentric(rng, &anchors, i, concentric_axes_range)
            .ok_or_else(|| Error::degenerate("concentric ellipsoid anchor", format!("no ellipsoid with index {i}")))?;
        compositor.add(&concentric)?;
    }
    Ok(compositor.finish())
}

#[cfg(test)]
mod test_blend {
    use super::*;
    use ndarray::{array, Array3};
    use proptest::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn brighter_overlay_replaces_with_own_opacity() {
        let mut v = array![[[0.2_f32, 0.5, 0.0]]];
        let o     = array![[[1.0_f32, 0.3, 0.0]]];
        blend(&mut v, o.view(), 0.4);
        assert_eq!(v, array![[[0.4, 0.5, 0.0]]]);
    }

    #[test]
    fn ties_go_to_the_later_overlay() {
        let mut v = Array3::<f32>::zeros([1, 1, 2]);
        blend(&mut v, array![[[0.6_f32, 0.0]]].view(), 1.0);
        assert_eq!(v, array![[[0.6, 0.0]]]);
        // Equal raw value at the first voxel: the incoming opacity wins
        blend(&mut v, array![[[0.6_f32, 0.0]]].view(), 0.5);
        assert_eq!(v, array![[[0.3, 0.0]]]);
    }

    #[test]
    fn dim_overlay_can_replace_bright_voxels_if_raw_value_dominates() {
        let mut v = array![[[0.9_f32]]];
        blend(&mut v, array![[[1.0_f32]]].view(), 0.1);
        assert_eq!(v, array![[[0.1]]]);
    }

    fn volume_and_overlay() -> impl Strategy<Value = (Vec<f32>, Vec<f32>, f32)> {
        (1..64_usize).prop_flat_map(|n| (
            prop::collection::vec(0.0..1.0_f32, n),
            prop::collection::vec(0.0..1.0_f32, n),
            0.0..=1.0_f32,
        ))
    }

    proptest! {
        #[test]
        fn blending_twice_is_blending_once((v, o, opacity) in volume_and_overlay()) {
            let n = v.len();
            let o = Array3::from_shape_vec([n, 1, 1], o).unwrap();
            let mut once = Array3::from_shape_vec([n, 1, 1], v).unwrap();
            blend(&mut once, o.view(), opacity);
            let mut twice = once.clone();
            blend(&mut twice, o.view(), opacity);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn blending_keeps_values_finite_and_non_negative((v, o, opacity) in volume_and_overlay()) {
            let n = v.len();
            let o = Array3::from_shape_vec([n, 1, 1], o).unwrap();
            let mut v = Array3::from_shape_vec([n, 1, 1], v).unwrap();
            blend(&mut v, o.view(), opacity);
            prop_assert!(v.iter().all(|x| x.is_finite() && *x >= 0.0));
        }
    }
}
