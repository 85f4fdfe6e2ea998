/// Read / write float arrays as headerless little-endian `f32` streams

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};
use std::path::Path;

use ndarray::Array4;

use crate::{Error, Result, types::Dataset};

pub fn write(data: impl IntoIterator<Item = f32>, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;
pub fn read<'a>(path: &Path) -> IORes<impl Iterator<Item = IORes<f32>> + 'a> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut buffer) {
            Ok(()) => Some(Ok(f32::from_le_bytes(buffer))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Read back a dataset written by `write`. The shape is not stored in the
/// file, so it must be supplied.
pub fn read_dataset(path: &Path, shape: [usize; 4]) -> Result<Dataset> {
    let data: Vec<f32> = read(path)
        .and_then(|values| values.collect())
        .map_err(Error::io(path))?;
    let n = data.len();
    Array4::from_shape_vec(shape, data)
        .map_err(|_| Error::GeometryMismatch(format!("{path:?} holds {n} values, cannot reshape to {shape:?}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn raw_io_roundtrip() -> std::io::Result<()> {
        // Harmless temporary location for output file
        let dir = tempdir()?;
        let file_path = dir.path().join("test.raw");

        let original_data = vec![1.23, 4.56, 7.89];
        write(original_data.iter().copied(), &file_path)?;
        let reloaded_data: Vec<_> = read(&file_path)?
            .collect::<std::result::Result<_, _>>()?;

        assert_eq!(original_data, reloaded_data);
        Ok(())
    }

    #[test]
    fn dataset_needs_matching_shape() -> Result<()> {
        let dir = tempdir().map_err(Error::io("tempdir"))?;
        let file_path = dir.path().join("data.raw");
        let data = Array4::from_shape_fn([2, 3, 4, 5], |(n, h, w, d)| (n + h + w + d) as f32);
        write(data.iter().copied(), &file_path).map_err(Error::io(&file_path))?;

        assert_eq!(read_dataset(&file_path, [2, 3, 4, 5])?, data);
        assert!(matches!(read_dataset(&file_path, [2, 3, 4, 6]), Err(Error::GeometryMismatch(_))));
        Ok(())
    }
}
