//! Cone-beam acquisition parameters: projection angles, detector size and
//! source/detector distances.

use ndarray::{Array3, ArrayView3};
use serde::Deserialize;

use crate::{Error, Result, types::Shape3};

/// Safety factor applied to in-plane volume dimensions so that the detector
/// covers the diagonal of the volume at any rotation.
pub const DIAGONAL_FACTOR: f64 = std::f64::consts::SQRT_2;

/// `count` evenly spaced angles from `start_deg` to `end_deg` inclusive,
/// in radians.
pub fn angles(start_deg: f32, end_deg: f32, count: usize) -> Result<Vec<f32>> {
    if count < 2 {
        return Err(Error::InvalidAngleRange(format!("need at least 2 projections, got {count}")))
    }
    if !(start_deg.is_finite() && end_deg.is_finite()) {
        return Err(Error::InvalidAngleRange(format!("non-finite bounds {start_deg}°..{end_deg}°")))
    }
    if start_deg == end_deg {
        return Err(Error::InvalidAngleRange(format!("empty range {start_deg}°..{end_deg}°")))
    }
    let (start, end) = (start_deg as f64, end_deg as f64);
    let step = (end - start) / (count - 1) as f64;
    let degrees = (0..count).map(|i| if i == count - 1 { end } else { start + i as f64 * step });
    Ok(degrees.map(|d| (d as f32).to_radians()).collect())
}

/// Like `angles`, but the range is given as a start and an amplitude
pub fn angles_from_amplitude(start_deg: f32, amplitude_deg: f32, count: usize) -> Result<Vec<f32>> {
    angles(start_deg, start_deg + amplitude_deg, count)
}

/// Reorder an `(H, W, D)` volume into the `(slices, rows, cols)` = `(D, H, W)`
/// layout expected by projectors.
pub fn projector_layout(volume: ArrayView3<f32>) -> Array3<f32> {
    volume.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
}

/// Detector `(rows, cols)` large enough to see a volume of `shape` (in
/// projector layout `(slices, rows, cols)`) from any angle.
pub fn detector_footprint_from_volume(shape: Shape3) -> (usize, usize) {
    let scale = |n: usize| (n as f64 * DIAGONAL_FACTOR).round() as usize;
    (scale(shape[1]), scale(shape[2]))
}

/// Detector `(rows, cols)` of an existing sinogram `(angles, rows, cols)`
pub fn detector_footprint_from_sinogram(shape: Shape3) -> (usize, usize) {
    (shape[1], shape[2])
}

/// Fixed acquisition constants, from which geometries are derived
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcquisitionConfig {
    /// First projection angle in degrees
    #[serde(default = "default_start_angle")]
    pub start_angle: f32,

    /// Last projection angle in degrees
    #[serde(default = "default_end_angle")]
    pub end_angle: f32,

    /// Number of projections
    #[serde(default = "default_n_angles")]
    pub n_angles: usize,

    /// Horizontal and vertical spacing of detector cells
    #[serde(default = "default_detector_spacing")]
    pub detector_spacing: (f32, f32),

    #[serde(default = "default_source_origin_distance")]
    pub source_origin_distance: f32,

    #[serde(default = "default_origin_detector_distance")]
    pub origin_detector_distance: f32,
}

// 70 cm and 6 cm at 100 micron voxel pitch
fn default_start_angle             () ->  f32       { -50.0 }
fn default_end_angle               () ->  f32       {  50.0 }
fn default_n_angles                () ->  usize     {  101  }
fn default_detector_spacing        () -> (f32, f32) { (1.0, 1.0) }
fn default_source_origin_distance  () ->  f32       { 7000.0 }
fn default_origin_detector_distance() ->  f32       {  600.0 }

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            start_angle:              default_start_angle(),
            end_angle:                default_end_angle(),
            n_angles:                 default_n_angles(),
            detector_spacing:         default_detector_spacing(),
            source_origin_distance:   default_source_origin_distance(),
            origin_detector_distance: default_origin_detector_distance(),
        }
    }
}

/// Everything a cone-beam projector needs to know about the acquisition
#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionGeometry {
    angles: Vec<f32>,
    detector_rows: usize,
    detector_cols: usize,
    detector_spacing: (f32, f32),
    source_origin_distance: f32,
    origin_detector_distance: f32,
}

impl AcquisitionGeometry {

    /// Geometry from explicit angles (radians). At least two finite angles
    /// are required, as for `angles`.
    pub fn new(angles: Vec<f32>, (detector_rows, detector_cols): (usize, usize), config: &AcquisitionConfig) -> Result<Self> {
        if angles.len() < 2 {
            return Err(Error::InvalidAngleRange(format!("need at least 2 projections, got {}", angles.len())))
        }
        if let Some(bad) = angles.iter().find(|a| !a.is_finite()) {
            return Err(Error::InvalidAngleRange(format!("non-finite angle {bad}")))
        }
        Ok(Self {
            angles,
            detector_rows,
            detector_cols,
            detector_spacing:         config.detector_spacing,
            source_origin_distance:   config.source_origin_distance,
            origin_detector_distance: config.origin_detector_distance,
        })
    }

    /// Geometry for projecting a volume whose projector-layout shape is `shape`
    pub fn for_volume(shape: Shape3, config: &AcquisitionConfig) -> Result<Self> {
        let angles = angles(config.start_angle, config.end_angle, config.n_angles)?;
        let footprint = detector_footprint_from_volume(shape);
        tracing::info!(?shape, rows = footprint.0, cols = footprint.1, n_angles = angles.len(), "derived geometry from volume");
        Self::new(angles, footprint, config)
    }

    /// Geometry for reconstructing from an existing sinogram of `shape`
    pub fn for_sinogram(shape: Shape3, config: &AcquisitionConfig) -> Result<Self> {
        if shape[0] != config.n_angles {
            return Err(Error::GeometryMismatch(format!(
                "sinogram has {} projections, configuration expects {}", shape[0], config.n_angles
            )))
        }
        let angles = angles(config.start_angle, config.end_angle, config.n_angles)?;
        let footprint = detector_footprint_from_sinogram(shape);
        tracing::info!(?shape, rows = footprint.0, cols = footprint.1, "derived geometry from sinogram");
        Self::new(angles, footprint, config)
    }

    /// Projection angles in radians
    pub fn angles(&self) -> &[f32] { &self.angles }
    pub fn detector_rows(&self) -> usize { self.detector_rows }
    pub fn detector_cols(&self) -> usize { self.detector_cols }
    pub fn detector_spacing(&self) -> (f32, f32) { self.detector_spacing }
    pub fn source_origin_distance(&self) -> f32 { self.source_origin_distance }
    pub fn origin_detector_distance(&self) -> f32 { self.origin_detector_distance }

    /// Shape `(angles, rows, cols)` of the sinograms described by this geometry
    pub fn sinogram_shape(&self) -> Shape3 {
        [self.angles.len(), self.detector_rows, self.detector_cols]
    }
}

impl std::fmt::Display for AcquisitionGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let degrees = |a: Option<&f32>| a.map_or(f32::NAN, |a| a.to_degrees());
        let (first, last) = (degrees(self.angles.first()), degrees(self.angles.last()));
        write!(f, "<cone beam: {} angles {:.1}°..{:.1}°, detector {}x{} @ {:?}, source {} / detector {}>",
               self.angles.len(), first, last,
               self.detector_rows, self.detector_cols, self.detector_spacing,
               self.source_origin_distance, self.origin_detector_distance)
    }
}


#[cfg(test)]
mod test_footprint {
    use super::*;
    use rstest::rstest;
    use ndarray::Array3;

    #[rstest(/**/ shape        , expected,
             case([ 32, 512, 512], (724, 724)),
             case([ 32, 512, 256], (724, 362)),
             case([  1,   1,   1], (  1,   1)),
             case([  8,  10, 100], ( 14, 141)),
    )]
    fn from_volume(shape: Shape3, expected: (usize, usize)) {
        assert_eq!(detector_footprint_from_volume(shape), expected);
        // Reproducible
        assert_eq!(detector_footprint_from_volume(shape), expected);
    }

    #[test]
    fn from_sinogram_uses_detector_axes() {
        assert_eq!(detector_footprint_from_sinogram([101, 45, 724]), (45, 724));
    }

    #[test]
    fn projector_layout_moves_depth_first() {
        let v = Array3::from_shape_fn([4, 5, 3], |(h, w, d)| (100 * h + 10 * w + d) as f32);
        let p = projector_layout(v.view());
        assert_eq!(p.shape(), &[3, 4, 5]);
        assert_eq!(p[[2, 1, 3]], v[[1, 3, 2]]);
        assert!(p.is_standard_layout());
    }
}

#[cfg(test)]
mod test_geometry {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let g = AcquisitionGeometry::for_volume([32, 512, 512], &AcquisitionConfig::default()).unwrap();
        assert_eq!(g.angles().len(), 101);
        assert_eq!((g.detector_rows(), g.detector_cols()), (724, 724));
        assert_eq!(g.detector_spacing(), (1.0, 1.0));
        assert_eq!(g.source_origin_distance(), 7000.0);
        assert_eq!(g.origin_detector_distance(), 600.0);
        assert_eq!(g.sinogram_shape(), [101, 724, 724]);
    }

    #[test]
    fn sinogram_round_trip_keeps_detector() {
        let config = AcquisitionConfig::default();
        let forward = AcquisitionGeometry::for_volume([16, 64, 64], &config).unwrap();
        let inverse = AcquisitionGeometry::for_sinogram(forward.sinogram_shape(), &config).unwrap();
        assert_eq!(forward, inverse);
    }

    #[test]
    fn sinogram_with_wrong_number_of_angles() {
        let config = AcquisitionConfig::default();
        let result = AcquisitionGeometry::for_sinogram([100, 90, 90], &config);
        assert!(matches!(result, Err(Error::GeometryMismatch(_))));
    }

    #[test]
    fn bad_angle_config_is_reported() {
        let config = AcquisitionConfig { n_angles: 1, ..Default::default() };
        let result = AcquisitionGeometry::for_volume([16, 64, 64], &config);
        assert!(matches!(result, Err(Error::InvalidAngleRange(_))));
    }

    #[test]
    fn explicit_angles_are_checked() {
        let config = AcquisitionConfig::default();
        for bad in [vec![], vec![0.5], vec![0.0, f32::NAN]] {
            let result = AcquisitionGeometry::new(bad, (4, 4), &config);
            assert!(matches!(result, Err(Error::InvalidAngleRange(_))), "{result:?}");
        }
        let g = AcquisitionGeometry::new(vec![0.0, std::f32::consts::FRAC_PI_2], (4, 6), &config).unwrap();
        assert_eq!(g.sinogram_shape(), [2, 4, 6]);
        assert!(g.to_string().starts_with("<cone beam: 2 angles 0.0°..90.0°, detector 4x6"));
    }

    #[test]
    fn display() {
        let g = AcquisitionGeometry::for_volume([16, 64, 64], &AcquisitionConfig::default()).unwrap();
        assert_eq!(g.to_string(),
                   "<cone beam: 101 angles -50.0°..50.0°, detector 91x91 @ (1.0, 1.0), source 7000 / detector 600>");
    }
}
