//! Instrument constants and calibration settings.
//!
//! Everything here is fixed for the lifetime of a reduction run. The cross
//! binarization thresholds and corner-refinement radii are empirically tuned
//! per instrument and must be supplied as calibration data; none of them
//! has a default.

use crate::util::{MaskError, MaskResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the pipeline installation root.
pub const INSTALL_ROOT_ENV: &str = "WIRC_DRP";

/// Fixed focal-plane geometry, in detector pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConstants {
    /// Side of the square field-of-view grid.
    pub fov_size: usize,
    /// Thickness of one spider vane.
    pub spider_thickness: usize,
    /// Width of the slit / occulting bar band.
    pub slit_width: usize,
}

impl InstrumentConstants {
    /// Creates validated constants.
    pub fn new(fov_size: usize, spider_thickness: usize, slit_width: usize) -> MaskResult<Self> {
        let constants = Self {
            fov_size,
            spider_thickness,
            slit_width,
        };
        constants.validate()?;
        Ok(constants)
    }

    /// Checks that every derived mask is non-degenerate on the grid.
    pub fn validate(&self) -> MaskResult<()> {
        if self.fov_size == 0 {
            return Err(MaskError::InvalidParameter {
                name: "fov_size",
                reason: "must be positive",
            });
        }
        if self.square_inset().saturating_mul(2) >= self.fov_size {
            return Err(MaskError::InvalidParameter {
                name: "spider_thickness",
                reason: "square footprint inset leaves no transmissive area",
            });
        }
        if self.slit_width >= self.fov_size {
            return Err(MaskError::InvalidParameter {
                name: "slit_width",
                reason: "slit band must be narrower than the field of view",
            });
        }
        Ok(())
    }

    /// Inset of the unvignetted direct-image square from each grid edge.
    pub fn square_inset(&self) -> usize {
        self.spider_thickness.saturating_mul(2)
    }

    /// Half-width of the unvignetted square, `fov_size / 2 - 2 * spider_thickness`.
    pub fn square_half_width(&self) -> usize {
        (self.fov_size / 2).saturating_sub(self.square_inset())
    }
}

/// Binarization strength for the cross-obscuration masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObscurationLevel {
    Low,
    Medium,
    High,
}

impl ObscurationLevel {
    /// All levels, lowest obscuration first.
    pub const ALL: [ObscurationLevel; 3] = [Self::Low, Self::Medium, Self::High];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Per-level gray-value cuts; pixels strictly below a cut are in shadow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObscurationThresholds {
    pub low: u8,
    pub medium: u8,
    pub high: u8,
}

impl ObscurationThresholds {
    /// Threshold for `level`.
    pub fn get(&self, level: ObscurationLevel) -> u8 {
        match level {
            ObscurationLevel::Low => self.low,
            ObscurationLevel::Medium => self.medium,
            ObscurationLevel::High => self.high,
        }
    }
}

/// One rendered cross-obscuration raster and its calibrated cuts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossLayer {
    /// Raster path, relative to the installation root unless absolute.
    pub path: PathBuf,
    pub thresholds: ObscurationThresholds,
}

/// Radii, in half-resolution pixels, of the three bands used to sharpen the
/// cross corners.
///
/// The annulus `(middle, outer]` around each corner is blocked; the disk of
/// radius `inner` always stays clear, so `inner <= middle <= outer`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerRefinement {
    pub inner: f64,
    pub middle: f64,
    pub outer: f64,
}

impl CornerRefinement {
    /// Radii must be finite, non-negative and ordered.
    pub fn validate(&self) -> MaskResult<()> {
        for r in [self.inner, self.middle, self.outer] {
            if !r.is_finite() || r < 0.0 {
                return Err(MaskError::InvalidParameter {
                    name: "refinement",
                    reason: "radii must be finite and non-negative",
                });
            }
        }
        if self.inner > self.middle || self.middle > self.outer {
            return Err(MaskError::InvalidParameter {
                name: "refinement",
                reason: "radii must satisfy inner <= middle <= outer",
            });
        }
        Ok(())
    }
}

/// Cross-mask calibration: two rasters at different resolutions plus the
/// corner refinement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossMaskConfig {
    pub layers: [CrossLayer; 2],
    pub refinement: CornerRefinement,
}

/// Locations of the persisted `.npy` templates, relative to the installation
/// root unless absolute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateFiles {
    pub trace_masks: PathBuf,
    pub cross_correlation: PathBuf,
    pub trace: PathBuf,
}

impl Default for TemplateFiles {
    fn default() -> Self {
        Self {
            trace_masks: PathBuf::from("wirc_drp/masks/trace_masks.npy"),
            cross_correlation: PathBuf::from("wirc_drp/masks/cross_correlation_template.npy"),
            trace: PathBuf::from("wirc_drp/masks/trace_template.npy"),
        }
    }
}

/// Complete startup configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Installation root; falls back to [`INSTALL_ROOT_ENV`] when absent.
    #[serde(default)]
    pub install_root: Option<PathBuf>,
    pub instrument: InstrumentConstants,
    pub cross: CrossMaskConfig,
    #[serde(default)]
    pub templates: TemplateFiles,
}

impl PipelineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(text: &str) -> MaskResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|err| MaskError::Config {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> MaskResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| MaskError::Config {
            reason: format!("{}: {err}", path.display()),
        })?;
        Self::from_json_str(&text)
    }

    /// Validates the instrument constants and refinement radii.
    pub fn validate(&self) -> MaskResult<()> {
        self.instrument.validate()?;
        self.cross.refinement.validate()
    }

    /// Returns the configured root, or the one named by [`INSTALL_ROOT_ENV`].
    pub fn install_root(&self) -> MaskResult<PathBuf> {
        match &self.install_root {
            Some(root) => Ok(root.clone()),
            None => install_root_from_env(INSTALL_ROOT_ENV),
        }
    }
}

/// Reads an installation root from environment variable `var`.
pub fn install_root_from_env(var: &str) -> MaskResult<PathBuf> {
    match env::var_os(var) {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => Err(MaskError::MissingEnvironment {
            var: var.to_string(),
        }),
    }
}

/// Joins `path` onto `root` unless it is already absolute.
pub(crate) fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
