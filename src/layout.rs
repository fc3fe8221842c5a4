//! Composite layout computation: canvas size and per-image placement.
//!
//! Takes the pixel dimensions of every source image plus the
//! [`LayoutParameters`] and computes where each image lands on the output
//! canvas. Pure geometry with no pixel operations; `no_std` compatible.
//!
//! # Example
//!
//! ```
//! use zencompose::layout::compute_layout;
//! use zencompose::params::{ArrangementMode, LayoutParameters};
//! use zencompose::{Rect, Size};
//!
//! let params = LayoutParameters::new(ArrangementMode::Horizontal);
//! let layout = compute_layout(&[Size::new(100, 50), Size::new(50, 100)], &params).unwrap();
//!
//! // Both images normalized to the tallest height (100).
//! assert_eq!(layout.canvas, Size::new(250, 100));
//! assert_eq!(layout.placements[0].rect, Rect::new(0, 0, 200, 100));
//! assert_eq!(layout.placements[1].rect, Rect::new(200, 0, 50, 100));
//! ```
//!
//! # Spacing
//!
//! Padding and border are fractions of half the largest source dimension,
//! so the same slider position looks alike on a phone snapshot and on a
//! 50-megapixel scan. A fraction of zero is exactly zero pixels.
//!
//! # Rounding
//!
//! All math runs in `f64`. Rounding to whole pixels happens once, at the
//! end, by snapping rectangle *edges* rather than sizes, so neighbors that
//! touch in exact coordinates still touch after rounding.

use alloc::vec::Vec;

use num_traits::Float;

use crate::geometry::{Rect, Size};
use crate::params::{ArrangementMode, LayoutParameters};

/// Where one source image lands on the canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Index of the source image in input order.
    pub index: usize,
    /// Destination rectangle; the image is resized to exactly this size.
    pub rect: Rect,
}

/// Grid geometry, present only for [`ArrangementMode::Grid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    /// Number of columns, `ceil(sqrt(n))`.
    pub cols: u32,
    /// Number of rows, `ceil(n / cols)`.
    pub rows: u32,
    /// Side of every (square) cell, the largest source dimension.
    pub cell: u32,
}

/// Computed layout for one composite.
///
/// Recomputed from scratch whenever the image set or the parameters change;
/// there is no incremental update.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeLayout {
    /// Arrangement this layout was computed for.
    pub arrangement: ArrangementMode,
    /// Output canvas dimensions.
    pub canvas: Size,
    /// One entry per source image, in input order.
    pub placements: Vec<Placement>,
    /// Exact gap between neighboring images, in pixels.
    pub padding_px: f64,
    /// Exact frame width, in pixels.
    pub border_px: f64,
    /// Cell geometry in grid mode.
    pub grid: Option<GridShape>,
}

impl CompositeLayout {
    /// Frame width in whole pixels, as the compositor strokes it.
    ///
    /// Never wider than half the canvas on either axis.
    pub fn border_band(&self) -> u32 {
        let band = snap(self.border_px);
        band.min(self.canvas.width / 2).min(self.canvas.height / 2)
    }

    /// Whether a frame is drawn at all.
    pub fn has_border(&self) -> bool {
        self.border_px > 0.0
    }

    /// Placement of the image at `index`, if any.
    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.iter().find(|p| p.index == index)
    }
}

/// Layout computation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A composite needs at least two images.
    #[error("a composite needs at least 2 images, got {count}")]
    InsufficientInput { count: usize },
    /// Source image has zero width or height.
    #[error("source image {index} has a zero dimension")]
    ZeroSourceDimension { index: usize },
}

/// Column and row count for a grid of `n` images.
///
/// `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`. Zero images give `(0, 0)`.
pub fn grid_shape(n: usize) -> (u32, u32) {
    if n == 0 {
        return (0, 0);
    }
    let cols = Float::ceil(Float::sqrt(n as f64)) as usize;
    let rows = n.div_ceil(cols);
    (cols as u32, rows as u32)
}

/// Compute the composite layout for sources of the given dimensions.
///
/// Fails with [`LayoutError::InsufficientInput`] for fewer than two sources.
/// Identical inputs always produce identical output.
pub fn compute_layout(
    sources: &[Size],
    params: &LayoutParameters,
) -> Result<CompositeLayout, LayoutError> {
    let n = sources.len();
    if n < 2 {
        return Err(LayoutError::InsufficientInput { count: n });
    }
    if let Some(index) = sources.iter().position(Size::is_empty) {
        return Err(LayoutError::ZeroSourceDimension { index });
    }

    let max_w = sources.iter().fold(0, |m, s| m.max(s.width)) as f64;
    let max_h = sources.iter().fold(0, |m, s| m.max(s.height)) as f64;
    let max_dim = max_w.max(max_h);

    let padding = params.padding.get() * (max_dim / 2.0);
    let border = params.border_width.get() * (max_dim / 2.0);

    let (extent, boxes, grid) = match params.arrangement {
        ArrangementMode::Horizontal => stack(sources, Axis::Horizontal, max_h, padding, border),
        ArrangementMode::Vertical => stack(sources, Axis::Vertical, max_w, padding, border),
        ArrangementMode::Grid => cells(sources, max_dim, padding, border),
    };

    let canvas = Size::new(snap(extent.0).max(1), snap(extent.1).max(1));
    let placements: Vec<Placement> = boxes
        .iter()
        .enumerate()
        .map(|(index, b)| Placement {
            index,
            rect: b.snap_within(canvas),
        })
        .collect();

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(
            arrangement = %params.arrangement,
            images = n,
            canvas_w = canvas.width,
            canvas_h = canvas.height,
            padding_px = padding,
            border_px = border,
            "composite layout computed"
        );
        for p in &placements {
            tracing::trace!(
                index = p.index,
                x = p.rect.x,
                y = p.rect.y,
                w = p.rect.width,
                h = p.rect.height,
                "placement"
            );
        }
    }

    Ok(CompositeLayout {
        arrangement: params.arrangement,
        canvas,
        placements,
        padding_px: padding,
        border_px: border,
        grid,
    })
}

/// Layout for already-decoded images.
#[cfg(feature = "render")]
pub fn compute_layout_for(
    images: &[crate::source::DecodedImage],
    params: &LayoutParameters,
) -> Result<CompositeLayout, LayoutError> {
    let sizes: Vec<Size> = images.iter().map(|img| img.size()).collect();
    compute_layout(&sizes, params)
}

// ============================================================================
// Internal geometry
// ============================================================================

/// Stacking direction for the single-row/column modes.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// A destination rectangle in exact (unrounded) canvas coordinates.
#[derive(Copy, Clone, Debug)]
struct ExactBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl ExactBox {
    /// Round edges to whole pixels and keep the result on the canvas.
    /// Width and height are at least 1.
    fn snap_within(&self, canvas: Size) -> Rect {
        let (x, width) = snap_span(self.x, self.w, canvas.width);
        let (y, height) = snap_span(self.y, self.h, canvas.height);
        Rect::new(x, y, width, height)
    }
}

/// Snap `[start, start + len)` to pixel edges within `0..limit`.
fn snap_span(start: f64, len: f64, limit: u32) -> (u32, u32) {
    let lo = snap(start).min(limit.saturating_sub(1));
    let hi = snap(start + len).min(limit);
    (lo, hi.saturating_sub(lo).max(1))
}

/// Round half away from zero; negatives and NaN become 0, overflow saturates.
fn snap(v: f64) -> u32 {
    Float::round(v) as u32
}

type Extent = (f64, f64);

/// Horizontal or vertical strip: every image normalized to `common` along the
/// cross axis, laid end to end with `padding` between neighbors.
fn stack(
    sources: &[Size],
    axis: Axis,
    common: f64,
    padding: f64,
    border: f64,
) -> (Extent, Vec<ExactBox>, Option<GridShape>) {
    let mut boxes = Vec::with_capacity(sources.len());
    let mut cursor = border;
    let mut total = 0.0;

    for s in sources {
        let (w, h) = (s.width as f64, s.height as f64);
        let b = match axis {
            Axis::Horizontal => {
                let scaled = w * (common / h);
                ExactBox {
                    x: cursor,
                    y: border,
                    w: scaled,
                    h: common,
                }
            }
            Axis::Vertical => {
                let scaled = h * (common / w);
                ExactBox {
                    x: border,
                    y: cursor,
                    w: common,
                    h: scaled,
                }
            }
        };
        let along = if axis == Axis::Horizontal { b.w } else { b.h };
        cursor += along + padding;
        total += along;
        boxes.push(b);
    }

    let gaps = padding * (sources.len() - 1) as f64;
    let along = total + gaps + 2.0 * border;
    let across = common + 2.0 * border;
    let extent = match axis {
        Axis::Horizontal => (along, across),
        Axis::Vertical => (across, along),
    };
    (extent, boxes, None)
}

/// Uniform square cells of side `cell`, row-major, each image letterboxed
/// and centered in its cell.
fn cells(
    sources: &[Size],
    cell: f64,
    padding: f64,
    border: f64,
) -> (Extent, Vec<ExactBox>, Option<GridShape>) {
    let (cols, rows) = grid_shape(sources.len());
    let pitch = cell + padding;

    let boxes = sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (w, h) = (s.width as f64, s.height as f64);
            let row = (i / cols as usize) as f64;
            let col = (i % cols as usize) as f64;
            let scale = (cell / w).min(cell / h);
            let (sw, sh) = (w * scale, h * scale);
            ExactBox {
                x: border + col * pitch + (cell - sw) / 2.0,
                y: border + row * pitch + (cell - sh) / 2.0,
                w: sw,
                h: sh,
            }
        })
        .collect();

    let span = |count: u32| {
        count as f64 * cell + count.saturating_sub(1) as f64 * padding + 2.0 * border
    };
    let grid = GridShape {
        cols,
        rows,
        cell: snap(cell),
    };
    ((span(cols), span(rows)), boxes, Some(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Fraction;

    fn params(mode: ArrangementMode) -> LayoutParameters {
        LayoutParameters::new(mode)
    }

    fn rects(layout: &CompositeLayout) -> Vec<Rect> {
        layout.placements.iter().map(|p| p.rect).collect()
    }

    // ── preconditions ───────────────────────────────────────────────────

    #[test]
    fn fewer_than_two_images_fails() {
        let p = params(ArrangementMode::Horizontal);
        assert_eq!(
            compute_layout(&[], &p),
            Err(LayoutError::InsufficientInput { count: 0 })
        );
        assert_eq!(
            compute_layout(&[Size::new(10, 10)], &p),
            Err(LayoutError::InsufficientInput { count: 1 })
        );
    }

    #[test]
    fn zero_dimension_fails() {
        let p = params(ArrangementMode::Grid);
        assert_eq!(
            compute_layout(&[Size::new(10, 10), Size::new(0, 10)], &p),
            Err(LayoutError::ZeroSourceDimension { index: 1 })
        );
    }

    // ── grid_shape ──────────────────────────────────────────────────────

    #[test]
    fn grid_shape_table() {
        assert_eq!(grid_shape(0), (0, 0));
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (2, 1));
        assert_eq!(grid_shape(3), (2, 2));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (3, 2));
        assert_eq!(grid_shape(9), (3, 3));
        assert_eq!(grid_shape(10), (4, 3));
    }

    // ── horizontal ──────────────────────────────────────────────────────

    #[test]
    fn horizontal_normalizes_to_tallest() {
        let layout = compute_layout(
            &[Size::new(100, 50), Size::new(50, 100)],
            &params(ArrangementMode::Horizontal),
        )
        .unwrap();
        assert_eq!(layout.canvas, Size::new(250, 100));
        assert_eq!(
            rects(&layout),
            [Rect::new(0, 0, 200, 100), Rect::new(200, 0, 50, 100)]
        );
        assert!(layout.grid.is_none());
        assert!(!layout.has_border());
    }

    #[test]
    fn horizontal_with_padding_and_border() {
        // maxDim = 200 → half = 100 → padding 10px, border 5px.
        let p = params(ArrangementMode::Horizontal)
            .padding_slider(10.0)
            .border_slider(5.0);
        let layout = compute_layout(&[Size::new(200, 100), Size::new(100, 100)], &p).unwrap();
        assert_eq!(layout.padding_px, 10.0);
        assert_eq!(layout.border_px, 5.0);
        assert_eq!(layout.border_band(), 5);
        // 200 + 100 + 10 + 2×5
        assert_eq!(layout.canvas, Size::new(320, 110));
        assert_eq!(
            rects(&layout),
            [Rect::new(5, 5, 200, 100), Rect::new(215, 5, 100, 100)]
        );
    }

    #[test]
    fn horizontal_keeps_input_order() {
        let layout = compute_layout(
            &[Size::new(10, 10), Size::new(30, 10), Size::new(20, 10)],
            &params(ArrangementMode::Horizontal),
        )
        .unwrap();
        let xs: Vec<u32> = layout.placements.iter().map(|p| p.rect.x).collect();
        assert_eq!(xs, [0, 10, 40]);
        let idx: Vec<usize> = layout.placements.iter().map(|p| p.index).collect();
        assert_eq!(idx, [0, 1, 2]);
    }

    #[test]
    fn horizontal_fractional_widths_snap_without_seams() {
        // 3 sources scaled to height 3 give widths of 1.5 each.
        let layout = compute_layout(
            &[Size::new(1, 2), Size::new(1, 2), Size::new(3, 3)],
            &params(ArrangementMode::Horizontal),
        )
        .unwrap();
        assert_eq!(layout.canvas, Size::new(6, 3));
        let r = rects(&layout);
        assert_eq!(r[0].right(), r[1].x);
        assert_eq!(r[1].right(), r[2].x);
        assert_eq!(r[2].right(), layout.canvas.width);
    }

    // ── vertical ────────────────────────────────────────────────────────

    #[test]
    fn vertical_normalizes_to_widest() {
        let layout = compute_layout(
            &[Size::new(100, 50), Size::new(50, 100)],
            &params(ArrangementMode::Vertical),
        )
        .unwrap();
        // Second image scaled ×2 to 100×200.
        assert_eq!(layout.canvas, Size::new(100, 250));
        assert_eq!(
            rects(&layout),
            [Rect::new(0, 0, 100, 50), Rect::new(0, 50, 100, 200)]
        );
    }

    #[test]
    fn vertical_with_border() {
        let p = params(ArrangementMode::Vertical).border_slider(10.0);
        let layout = compute_layout(&[Size::new(100, 100), Size::new(100, 100)], &p).unwrap();
        assert_eq!(layout.canvas, Size::new(110, 210));
        assert_eq!(
            rects(&layout),
            [Rect::new(5, 5, 100, 100), Rect::new(5, 105, 100, 100)]
        );
    }

    // ── grid ────────────────────────────────────────────────────────────

    #[test]
    fn grid_of_four_squares_with_padding() {
        // maxDim = 100 → half = 50 → slider 20 = 10px.
        let p = params(ArrangementMode::Grid).padding_slider(20.0);
        let layout = compute_layout(&[Size::new(100, 100); 4], &p).unwrap();
        assert_eq!(layout.canvas, Size::new(210, 210));
        assert_eq!(
            rects(&layout),
            [
                Rect::new(0, 0, 100, 100),
                Rect::new(110, 0, 100, 100),
                Rect::new(0, 110, 100, 100),
                Rect::new(110, 110, 100, 100),
            ]
        );
        assert_eq!(
            layout.grid,
            Some(GridShape {
                cols: 2,
                rows: 2,
                cell: 100
            })
        );
    }

    #[test]
    fn grid_letterboxes_and_centers() {
        let layout = compute_layout(
            &[Size::new(200, 100), Size::new(50, 100)],
            &params(ArrangementMode::Grid),
        )
        .unwrap();
        // Two cells of 200×200 side by side.
        assert_eq!(layout.canvas, Size::new(400, 200));
        assert_eq!(
            rects(&layout),
            [Rect::new(0, 50, 200, 100), Rect::new(250, 0, 100, 200)]
        );
    }

    #[test]
    fn grid_partial_last_row() {
        let layout =
            compute_layout(&[Size::new(10, 10); 5], &params(ArrangementMode::Grid)).unwrap();
        assert_eq!(layout.canvas, Size::new(30, 20));
        assert_eq!(layout.placements[3].rect, Rect::new(0, 10, 10, 10));
        assert_eq!(layout.placements[4].rect, Rect::new(10, 10, 10, 10));
    }

    // ── spacing ─────────────────────────────────────────────────────────

    #[test]
    fn zero_fractions_are_exactly_zero() {
        let p = LayoutParameters {
            padding: Fraction::ZERO,
            border_width: Fraction::ZERO,
            ..params(ArrangementMode::Grid)
        };
        let layout = compute_layout(&[Size::new(7, 3), Size::new(3, 7)], &p).unwrap();
        assert_eq!(layout.padding_px, 0.0);
        assert_eq!(layout.border_px, 0.0);
        assert_eq!(layout.border_band(), 0);
        assert_eq!(layout.canvas, Size::new(14, 7));
    }

    #[test]
    fn full_border_is_half_max_dimension() {
        let p = params(ArrangementMode::Horizontal).border_slider(100.0);
        let layout = compute_layout(&[Size::new(40, 20), Size::new(20, 20)], &p).unwrap();
        assert_eq!(layout.border_px, 20.0);
        assert_eq!(layout.canvas, Size::new(60 + 40, 20 + 40));
        assert_eq!(layout.placements[0].rect, Rect::new(20, 20, 40, 20));
    }

    #[test]
    fn placement_lookup() {
        let layout = compute_layout(
            &[Size::new(10, 10), Size::new(10, 10)],
            &params(ArrangementMode::Vertical),
        )
        .unwrap();
        assert_eq!(layout.placement(1).map(|p| p.rect.y), Some(10));
        assert!(layout.placement(2).is_none());
    }

    // ── snapping ────────────────────────────────────────────────────────

    #[test]
    fn snap_span_keeps_minimum_width() {
        assert_eq!(snap_span(10.0, 0.2, 100), (10, 1));
        assert_eq!(snap_span(99.8, 0.1, 100), (99, 1));
    }

    #[test]
    fn snap_handles_negative_and_nan() {
        assert_eq!(snap(-3.0), 0);
        assert_eq!(snap(f64::NAN), 0);
        assert_eq!(snap(2.5), 3);
    }
}
