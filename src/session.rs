//! Recompute-on-change session over an image set and its parameters.
//!
//! Every mutation bumps a generation counter. A render is tagged with the
//! generation it started from, and [`Session::accept`] only keeps outputs
//! whose generation still matches, so a slow render finishing after the
//! user moved a slider can never overwrite a newer result.

use std::time::{Duration, Instant};

use crate::compose::{self, Composite, RenderError};
use crate::layout::{CompositeLayout, LayoutError, compute_layout_for};
use crate::params::LayoutParameters;
use crate::source::ImageSet;

/// A finished render, tagged with the session generation it was built from.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub generation: u64,
    pub layout: CompositeLayout,
    pub composite: Composite,
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    images: ImageSet,
    params: LayoutParameters,
    generation: u64,
    current: Option<RenderOutput>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: LayoutParameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &LayoutParameters {
        &self.params
    }

    /// Replace the parameters. A no-op if nothing changed.
    pub fn set_params(&mut self, params: LayoutParameters) {
        if params != self.params {
            self.params = params;
            self.invalidate();
        }
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    /// Mutable access to the image set. Always invalidates the current output.
    pub fn images_mut(&mut self) -> &mut ImageSet {
        self.invalidate();
        &mut self.images
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Render the current state from scratch.
    ///
    /// `Ok(None)` while fewer than two images are loaded.
    pub fn render(&self) -> Result<Option<RenderOutput>, RenderError> {
        let images = self.images.images();
        let layout = match compute_layout_for(images, &self.params) {
            Ok(layout) => layout,
            Err(LayoutError::InsufficientInput { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let composite = compose::render(&layout, images, &self.params)?;
        Ok(Some(RenderOutput {
            generation: self.generation,
            layout,
            composite,
        }))
    }

    /// Keep `output` as the current result if it is not stale.
    ///
    /// Returns whether it was kept.
    pub fn accept(&mut self, output: RenderOutput) -> bool {
        if output.generation != self.generation {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                stale = output.generation,
                current = self.generation,
                "discarding stale render"
            );
            return false;
        }
        self.current = Some(output);
        true
    }

    /// Render and accept in one step. Returns the new current output.
    pub fn refresh(&mut self) -> Result<Option<&RenderOutput>, RenderError> {
        match self.render()? {
            Some(output) => {
                self.accept(output);
                Ok(self.current.as_ref())
            }
            None => Ok(None),
        }
    }

    /// The last accepted output, cleared by every mutation.
    pub fn current(&self) -> Option<&RenderOutput> {
        self.current.as_ref()
    }

    /// Back to a fresh tool: no images, default parameters with a black
    /// border color.
    pub fn reset(&mut self) {
        self.images.clear();
        self.params = LayoutParameters::default().border_color(crate::geometry::Rgb::BLACK);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.current = None;
    }
}

/// Trailing-edge debounce for bursts of parameter changes.
///
/// Call [`poke`](Self::poke) on every change and render once
/// [`should_fire`](Self::should_fire) returns `true`.
#[derive(Copy, Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    /// Record a change at `now`, restarting the quiet period.
    pub fn poke(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// `true` once, when a change is pending and `delay` has passed since the
    /// last poke.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}
