//! Persisted reference templates, loaded once at startup.
//!
//! Three `.npy` artifacts live under the installation root: the trace-mask
//! stack (one plane per expected trace position), the cross-correlation
//! template used to find sources, and the trace template used to find a
//! trace inside a cutout. Shapes are kept exactly as stored.

mod npy;
mod plan;

pub use plan::CorrelationPlan;

use crate::config::{resolve, TemplateFiles};
use crate::image::Grid;
use crate::telemetry::{trace_event, trace_span};
use crate::util::{MaskError, MaskResult};
use std::path::Path;

/// Ordered stack of equally shaped trace-mask planes.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceMaskStack {
    planes: Vec<Grid<f64>>,
}

impl TraceMaskStack {
    /// Builds a stack; every plane must share the first plane's shape.
    pub fn new(planes: Vec<Grid<f64>>) -> MaskResult<Self> {
        if let Some(first) = planes.first() {
            let expected = first.shape();
            if let Some(bad) = planes.iter().find(|p| p.shape() != expected) {
                return Err(MaskError::ShapeMismatch {
                    expected,
                    got: bad.shape(),
                });
            }
        }
        Ok(Self { planes })
    }

    /// Number of planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Plane `index`, in storage order.
    pub fn plane(&self, index: usize) -> Option<&Grid<f64>> {
        self.planes.get(index)
    }

    pub fn planes(&self) -> &[Grid<f64>] {
        &self.planes
    }

    /// `(width, height)` shared by all planes.
    pub fn plane_shape(&self) -> Option<(usize, usize)> {
        self.planes.first().map(Grid::shape)
    }
}

/// The three immutable reference templates.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateSet {
    trace_masks: TraceMaskStack,
    cross_correlation: Grid<f64>,
    trace: Grid<f64>,
}

impl TemplateSet {
    pub fn from_parts(
        trace_masks: TraceMaskStack,
        cross_correlation: Grid<f64>,
        trace: Grid<f64>,
    ) -> Self {
        Self {
            trace_masks,
            cross_correlation,
            trace,
        }
    }

    /// Loads all three templates from `files`, resolved against `root`.
    pub fn load(root: &Path, files: &TemplateFiles) -> MaskResult<Self> {
        let _span = trace_span!("template_load").entered();
        let trace_masks = load_stack(&resolve(root, &files.trace_masks))?;
        let cross_correlation = load_plane(&resolve(root, &files.cross_correlation))?;
        let trace = load_plane(&resolve(root, &files.trace))?;
        trace_event!(
            "templates_loaded",
            trace_planes = trace_masks.len(),
            cross_width = cross_correlation.width(),
            cross_height = cross_correlation.height(),
            trace_width = trace.width(),
            trace_height = trace.height(),
        );
        Ok(Self::from_parts(trace_masks, cross_correlation, trace))
    }

    pub fn trace_masks(&self) -> &TraceMaskStack {
        &self.trace_masks
    }

    pub fn cross_correlation(&self) -> &Grid<f64> {
        &self.cross_correlation
    }

    pub fn trace(&self) -> &Grid<f64> {
        &self.trace
    }
}

/// Loads a 2-D `(rows, cols)` array: a template, or a frame saved upstream.
pub fn load_plane(path: &Path) -> MaskResult<Grid<f64>> {
    let array = npy::read_f64(path)?;
    match array.shape.as_slice() {
        &[height, width] => grid_or_corrupt(path, array.data, width, height),
        other => Err(MaskError::CorruptResource {
            path: path.to_path_buf(),
            reason: format!("expected a 2-D array, found shape {other:?}"),
        }),
    }
}

/// Loads a 3-D `(planes, rows, cols)` stack.
pub fn load_stack(path: &Path) -> MaskResult<TraceMaskStack> {
    let array = npy::read_f64(path)?;
    let &[count, height, width] = array.shape.as_slice() else {
        return Err(MaskError::CorruptResource {
            path: path.to_path_buf(),
            reason: format!("expected a 3-D array, found shape {:?}", array.shape),
        });
    };
    let plane_len = width * height;
    let mut planes = Vec::with_capacity(count);
    for chunk in array.data.chunks_exact(plane_len.max(1)).take(count) {
        planes.push(grid_or_corrupt(path, chunk.to_vec(), width, height)?);
    }
    if planes.len() != count {
        return Err(MaskError::CorruptResource {
            path: path.to_path_buf(),
            reason: format!("expected {count} planes, found {}", planes.len()),
        });
    }
    TraceMaskStack::new(planes)
}

fn grid_or_corrupt(
    path: &Path,
    data: Vec<f64>,
    width: usize,
    height: usize,
) -> MaskResult<Grid<f64>> {
    Grid::new(data, width, height).map_err(|err| MaskError::CorruptResource {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
