//! Focal-plane masks and trace templates for a dual-beam imaging
//! polarimeter/spectrograph.
//!
//! The crate builds the binary region masks that say where light from a point
//! source lands on the detector (direct-image footprint, spider cross, slit
//! band, per-source trace bands), loads the reference templates used to find
//! sources and traces, and localizes them by zero-mean normalized
//! cross-correlation. Startup state lives in an immutable
//! [`ReductionContext`]; per-source masks are built by pure functions in
//! [`mask::dynamic`]. Parallel scans are available via the `rayon` feature
//! and structured logging via the `tracing` feature.

mod candidate;
pub mod config;
pub mod context;
pub mod image;
pub mod kernel;
pub mod locate;
pub mod mask;
mod refine;
pub(crate) mod telemetry;
pub mod templates;
pub mod util;

pub use candidate::nms::nms_2d;
pub use candidate::topk::{Peak, TopK};
pub use config::{
    CornerRefinement, CrossLayer, CrossMaskConfig, InstrumentConstants, ObscurationLevel,
    ObscurationThresholds, PipelineConfig, TemplateFiles, INSTALL_ROOT_ENV,
};
pub use context::ReductionContext;
pub use image::{Grid, ImageView};
pub use kernel::scalar::ZnccScalar;
pub use kernel::{Kernel, ScanParams};
pub use locate::{LocateConfig, Location, Locator};
pub use mask::dynamic::{diagonal_mask, trace_mask_from_fit, TraceFit};
pub use mask::geometry::{circular_region, radial_field, square_region, Inclusion};
pub use mask::library::{CrossRaster, MaskLibrary};
pub use mask::RegionMask;
pub use templates::{CorrelationPlan, TemplateSet, TraceMaskStack};
pub use util::{MaskError, MaskResult};
