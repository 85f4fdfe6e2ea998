//! NumPy `.npy` / `.npz` files

use std::fs::File;
use std::path::Path;

use ndarray::{Array, ArrayBase, Data, Dimension};
use ndarray_npy::{NpzWriter, ReadNpyExt, WritableElement, ReadableElement};

use crate::{Error, Result};

pub fn write_npy<S, D>(data: &ArrayBase<S, D>, path: &Path) -> Result<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    ndarray_npy::write_npy(path, data)
        .map_err(|source| Error::NpyWrite { path: path.into(), source })
}

/// Single-array archive; the array is stored as `arr_0`, as `numpy.savez` does.
pub fn write_npz<S, D>(data: &ArrayBase<S, D>, path: &Path) -> Result<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    let npz_error = |source| Error::Npz { path: path.into(), source };
    let file = File::create(path).map_err(Error::io(path))?;
    let mut npz = NpzWriter::new(file);
    npz.add_array("arr_0", data).map_err(npz_error)?;
    npz.finish().map_err(npz_error)?;
    Ok(())
}

pub fn read_npy<A, D>(path: &Path) -> Result<Array<A, D>>
where
    A: ReadableElement,
    D: Dimension,
{
    let file = File::open(path).map_err(Error::io(path))?;
    Array::<A, D>::read_npy(file)
        .map_err(|source| Error::NpyRead { path: path.into(), source })
}
