//! Startup context shared read-only by every per-frame stage.
//!
//! [`ReductionContext`] is built once, before any frame is processed, and
//! then passed by reference. It owns the instrument constants, the static
//! mask library, the reference templates and the correlation plans derived
//! from them. Nothing in it is mutated after construction, so it can be
//! shared across threads without locking.

use crate::config::{InstrumentConstants, ObscurationLevel, PipelineConfig};
use crate::image::ImageView;
use crate::locate::{locate_with, locate_within, LocateConfig, Location};
use crate::mask::library::MaskLibrary;
use crate::mask::RegionMask;
use crate::telemetry::trace_span;
use crate::templates::{CorrelationPlan, TemplateSet};
use crate::util::{MaskError, MaskResult};

/// Immutable startup state for one reduction run.
#[derive(Clone, Debug)]
pub struct ReductionContext {
    constants: InstrumentConstants,
    masks: MaskLibrary,
    templates: TemplateSet,
    source_plan: CorrelationPlan,
    trace_plan: CorrelationPlan,
}

impl ReductionContext {
    /// Loads calibration rasters and templates and builds every static mask.
    ///
    /// Any failure here is fatal for the run; there is no partial context.
    pub fn initialize(config: &PipelineConfig) -> MaskResult<Self> {
        let _span = trace_span!("context_initialize").entered();
        config.validate()?;
        let root = config.install_root()?;
        let masks = MaskLibrary::load(&config.instrument, &config.cross, &root)?;
        let templates = TemplateSet::load(&root, &config.templates)?;
        Self::from_parts(config.instrument, masks, templates)
    }

    /// Assembles a context from already built parts.
    pub fn from_parts(
        constants: InstrumentConstants,
        masks: MaskLibrary,
        templates: TemplateSet,
    ) -> MaskResult<Self> {
        constants.validate()?;
        if masks.fov_size() != constants.fov_size {
            return Err(MaskError::ShapeMismatch {
                expected: (constants.fov_size, constants.fov_size),
                got: (masks.fov_size(), masks.fov_size()),
            });
        }
        let source_plan = CorrelationPlan::from_view(templates.cross_correlation().view())?;
        let trace_plan = CorrelationPlan::from_view(templates.trace().view())?;
        Ok(Self {
            constants,
            masks,
            templates,
            source_plan,
            trace_plan,
        })
    }

    pub fn constants(&self) -> &InstrumentConstants {
        &self.constants
    }

    pub fn masks(&self) -> &MaskLibrary {
        &self.masks
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Finds sources in a full-field direct image.
    ///
    /// Only placements whose template center lies on a transmissive pixel of
    /// the medium-level cross mask are considered, so nothing is reported
    /// behind the spiders. `frame` must be `fov_size x fov_size`.
    pub fn locate_sources(
        &self,
        frame: ImageView<'_, f64>,
        cfg: LocateConfig,
    ) -> MaskResult<Vec<Location>> {
        self.locate_sources_in(frame, self.masks.cross(ObscurationLevel::Medium), cfg)
    }

    /// Finds sources whose centers fall inside `footprint`, which must have
    /// the shape of `frame`.
    pub fn locate_sources_in(
        &self,
        frame: ImageView<'_, f64>,
        footprint: &RegionMask,
        cfg: LocateConfig,
    ) -> MaskResult<Vec<Location>> {
        locate_within(&self.source_plan, &cfg, frame, footprint)
    }

    /// Correlates the trace template against a cutout.
    ///
    /// With `weights`, only the template pixels inside that mask take part,
    /// for example a [`diagonal_mask`](crate::mask::dynamic::diagonal_mask)
    /// of the template's size.
    pub fn locate_trace(
        &self,
        cutout: ImageView<'_, f64>,
        weights: Option<&RegionMask>,
        cfg: LocateConfig,
    ) -> MaskResult<Vec<Location>> {
        match weights {
            Some(mask) => {
                let plan = CorrelationPlan::from_masked(self.templates.trace().view(), mask)?;
                locate_with(&plan, &cfg, cutout)
            }
            None => locate_with(&self.trace_plan, &cfg, cutout),
        }
    }
}
