//! `.npy` reading through `npyz`.

use crate::util::{MaskError, MaskResult};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

/// A C-order `float64` array with its shape, outermost axis first.
#[derive(Debug)]
pub(crate) struct NpyArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Reads a whole `.npy` file as `float64`.
///
/// The payload must contain exactly the number of elements the header
/// declares; a short file is rejected rather than returned partially filled.
pub(crate) fn read_f64(path: &Path) -> MaskResult<NpyArray> {
    let corrupt = |reason: String| MaskError::CorruptResource {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|err| MaskError::ResourceNotFound {
        path: path.to_path_buf(),
        reason: match err.kind() {
            ErrorKind::NotFound => "no such file".to_string(),
            _ => err.to_string(),
        },
    })?;
    let npy = npyz::NpyFile::new(BufReader::new(file))
        .map_err(|err| corrupt(format!("bad npy header: {err}")))?;

    if npy.order() == npyz::Order::Fortran {
        return Err(corrupt("fortran-order arrays are not supported".to_string()));
    }
    let shape: Vec<usize> = npy.shape().iter().map(|&d| d as usize).collect();
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| corrupt(format!("shape {shape:?} overflows")))?;

    let data = npy
        .into_vec::<f64>()
        .map_err(|err| corrupt(format!("payload: {err}")))?;
    if data.len() != expected {
        return Err(corrupt(format!(
            "payload holds {} elements, header declares {expected}",
            data.len()
        )));
    }
    Ok(NpyArray { shape, data })
}
