//! Per-sample stacks of 16-bit TIFF slices

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::{Error, Result, types::Dataset};
use super::SliceMode;

/// Orientations actually written for `mode`, as (name, axis sliced along)
fn orientations(mode: SliceMode) -> Vec<(&'static str, Axis)> {
    match mode {
        SliceMode::Xy       => vec![("xy", Axis(2))],
        SliceMode::Yt       => vec![("yt", Axis(0))],
        SliceMode::Xt       => vec![("xt", Axis(1))],
        SliceMode::Parallel => vec![("xy", Axis(2)), ("yt", Axis(0)), ("xt", Axis(1))],
    }
}

/// Write every sample of `data` as a directory `<name>_<sample>_<orientation>`
/// of slices `slice_<k>.tif`. Returns the directories created.
pub fn write_slices(data: &Dataset, dir: &Path, name: &str, mode: SliceMode) -> Result<Vec<PathBuf>> {
    let mut written = vec![];
    for (i, volume) in data.axis_iter(Axis(0)).enumerate() {
        for (orientation, axis) in orientations(mode) {
            let stack_dir = dir.join(format!("{name}_{i}_{orientation}"));
            write_stack(volume, axis, &stack_dir)?;
            written.push(stack_dir);
        }
    }
    Ok(written)
}

fn write_stack(volume: ArrayView3<f32>, axis: Axis, stack_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(stack_dir).map_err(Error::io(stack_dir))?;
    for (k, slice) in volume.axis_iter(axis).enumerate() {
        let path = stack_dir.join(format!("slice_{k:04}.tif"));
        to_image(slice)
            .save(&path)
            .map_err(|source| Error::Image { path, source })?;
    }
    Ok(())
}

/// Map `[0, 1]` onto the full `u16` range, clamping anything outside
fn to_image(slice: ArrayView2<f32>) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    let (rows, cols) = slice.dim();
    let pixels = slice.iter()
        .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
        .collect();
    ImageBuffer::from_raw(cols as u32, rows as u32, pixels)
        .expect("buffer length is rows * cols by construction")
}
