//! Compositor: paints decoded images onto a fresh canvas per a computed layout.
//!
//! Drawing order is fixed: background fill, then the frame, then every
//! placement in input order. Each call allocates its own buffer and never
//! touches the source pixels.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::geometry::{Rect, Rgb, Size};
use crate::layout::{CompositeLayout, LayoutError, compute_layout_for};
use crate::params::LayoutParameters;
use crate::source::{DecodedImage, Origin};

/// Largest canvas side we will allocate.
pub const MAX_CANVAS_DIMENSION: u32 = 32_767;

/// Largest canvas area we will allocate, in pixels.
pub const MAX_CANVAS_AREA: u64 = 268_435_456;

/// Rendering failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Image list doesn't match the layout it is drawn with.
    #[error("layout places {expected} images but {actual} were supplied")]
    ImageCountMismatch { expected: usize, actual: usize },
    /// A placement refers to an image that wasn't supplied.
    #[error("placement refers to image {index} but only {count} were supplied")]
    PlacementOutOfRange { index: usize, count: usize },
    /// Canvas exceeds the allocation limits.
    #[error("canvas {canvas} exceeds the 32767px side or 268435456px area limit")]
    CanvasTooLarge { canvas: Size },
}

/// A rendered composite.
#[derive(Clone, Debug)]
pub struct Composite {
    image: RgbaImage,
    tainted: bool,
}

impl Composite {
    /// Canvas dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    /// The rendered pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Take the rendered pixels, dropping the taint flag.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Whether a cross-origin source was drawn. Tainted composites can't be
    /// exported.
    pub fn is_tainted(&self) -> bool {
        self.tainted
    }
}

/// Paint `images` onto a new canvas according to `layout`.
///
/// `images` must be in the order the layout was computed for.
pub fn render(
    layout: &CompositeLayout,
    images: &[DecodedImage],
    params: &LayoutParameters,
) -> Result<Composite, RenderError> {
    if images.len() != layout.placements.len() {
        return Err(RenderError::ImageCountMismatch {
            expected: layout.placements.len(),
            actual: images.len(),
        });
    }
    check_canvas(layout.canvas)?;

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "render",
        canvas_w = layout.canvas.width,
        canvas_h = layout.canvas.height,
        images = images.len()
    )
    .entered();

    let Size { width, height } = layout.canvas;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(params.background.to_rgba()));

    if layout.has_border() {
        stroke_frame(&mut canvas, layout.border_band(), params.border_color);
    }

    for placement in &layout.placements {
        let source = images
            .get(placement.index)
            .ok_or(RenderError::PlacementOutOfRange {
                index: placement.index,
                count: images.len(),
            })?;
        draw(&mut canvas, source.pixels(), placement.rect);
    }

    let tainted = images.iter().any(|img| img.origin() == Origin::CrossOrigin);

    #[cfg(feature = "tracing")]
    tracing::debug!(tainted, "composite rendered");

    Ok(Composite {
        image: canvas,
        tainted,
    })
}

/// Compute the layout and render in one step.
pub fn render_images(
    images: &[DecodedImage],
    params: &LayoutParameters,
) -> Result<(CompositeLayout, Composite), RenderError> {
    let layout = compute_layout_for(images, params)?;
    let composite = render(&layout, images, params)?;
    Ok((layout, composite))
}

fn check_canvas(canvas: Size) -> Result<(), RenderError> {
    if canvas.width > MAX_CANVAS_DIMENSION
        || canvas.height > MAX_CANVAS_DIMENSION
        || canvas.area() > MAX_CANVAS_AREA
    {
        return Err(RenderError::CanvasTooLarge { canvas });
    }
    Ok(())
}

/// Four bands of width `band` along the canvas edges.
fn stroke_frame(canvas: &mut RgbaImage, band: u32, color: Rgb) {
    if band == 0 {
        return;
    }
    let (w, h) = canvas.dimensions();
    let px = Rgba(color.to_rgba());
    fill_rect(canvas, Rect::new(0, 0, w, band), px);
    fill_rect(canvas, Rect::new(0, h - band, w, band), px);
    fill_rect(canvas, Rect::new(0, band, band, h - 2 * band), px);
    fill_rect(canvas, Rect::new(w - band, band, band, h - 2 * band), px);
}

/// Opaque fill, clipped to the canvas.
fn fill_rect(canvas: &mut RgbaImage, rect: Rect, px: Rgba<u8>) {
    let right = rect.right().min(canvas.width());
    let bottom = rect.bottom().min(canvas.height());
    for y in rect.y..bottom {
        for x in rect.x..right {
            canvas.put_pixel(x, y, px);
        }
    }
}

/// Resize `source` to the placement and blend it source-over.
fn draw(canvas: &mut RgbaImage, source: &RgbaImage, rect: Rect) {
    let scaled: Cow<'_, RgbaImage> = if source.dimensions() == (rect.width, rect.height) {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(imageops::resize(
            source,
            rect.width,
            rect.height,
            FilterType::Triangle,
        ))
    };
    imageops::overlay(canvas, &*scaled, i64::from(rect.x), i64::from(rect.y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::params::ArrangementMode;
    use crate::source::ImageSet;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn set(images: &[(u32, u32, Rgba<u8>)]) -> ImageSet {
        let mut set = ImageSet::new();
        for (i, &(w, h, px)) in images.iter().enumerate() {
            set.push_decoded(format!("{i}.png"), Origin::Local, RgbaImage::from_pixel(w, h, px))
                .unwrap();
        }
        set
    }

    #[test]
    fn background_and_images() {
        let set = set(&[(10, 10, RED), (10, 10, BLUE)]);
        let p = LayoutParameters::new(ArrangementMode::Horizontal)
            .padding_slider(40.0)
            .background(Rgb::new(0, 255, 0));
        let (layout, out) = render_images(set.images(), &p).unwrap();

        // padding = 0.4 × 5 = 2px
        assert_eq!(layout.canvas, Size::new(22, 10));
        assert_eq!(out.size(), layout.canvas);
        let img = out.image();
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(9, 9), RED);
        assert_eq!(*img.get_pixel(10, 5), Rgba([0, 255, 0, 255]));
        assert_eq!(*img.get_pixel(11, 5), Rgba([0, 255, 0, 255]));
        assert_eq!(*img.get_pixel(12, 0), BLUE);
        assert!(!out.is_tainted());
    }

    #[test]
    fn border_is_drawn_under_images() {
        let set = set(&[(20, 20, RED), (20, 20, RED)]);
        // border = 0.2 × 10 = 2px
        let p = LayoutParameters::new(ArrangementMode::Vertical)
            .border_slider(20.0)
            .background(Rgb::WHITE)
            .border_color(Rgb::BLACK);
        let (layout, out) = render_images(set.images(), &p).unwrap();
        assert_eq!(layout.canvas, Size::new(24, 44));
        let img = out.image().clone();
        let black = Rgba([0, 0, 0, 255]);
        assert_eq!(*img.get_pixel(0, 0), black);
        assert_eq!(*img.get_pixel(1, 20), black);
        assert_eq!(*img.get_pixel(23, 43), black);
        assert_eq!(*img.get_pixel(12, 42), black);
        assert_eq!(*img.get_pixel(2, 2), RED);
        assert_eq!(*img.get_pixel(21, 41), RED);
    }

    #[test]
    fn no_border_when_width_is_zero() {
        let set = set(&[(4, 4, RED), (4, 4, RED)]);
        let p = LayoutParameters::new(ArrangementMode::Grid)
            .padding_slider(100.0)
            .border_color(Rgb::BLACK);
        let (_, out) = render_images(set.images(), &p).unwrap();
        // Gap between the two cells stays background.
        assert_eq!(*out.image().get_pixel(5, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.image().get_pixel(0, 0), RED);
    }

    #[test]
    fn images_are_scaled_to_placement() {
        let set = set(&[(1, 2, BLUE), (4, 4, RED)]);
        let p = LayoutParameters::new(ArrangementMode::Horizontal);
        let (layout, out) = render_images(set.images(), &p).unwrap();
        // 1×2 becomes 2×4.
        assert_eq!(layout.placements[0].rect, Rect::new(0, 0, 2, 4));
        assert_eq!(*out.image().get_pixel(1, 3), BLUE);
        assert_eq!(*out.image().get_pixel(2, 0), RED);
    }

    #[test]
    fn transparent_pixels_show_background() {
        let clear = Rgba([0, 0, 0, 0]);
        let set = set(&[(3, 3, clear), (3, 3, RED)]);
        let p = LayoutParameters::new(ArrangementMode::Horizontal).background(Rgb::new(9, 9, 9));
        let (_, out) = render_images(set.images(), &p).unwrap();
        assert_eq!(*out.image().get_pixel(1, 1), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let set = set(&[(2, 2, RED), (8, 8, BLUE)]);
        let before: Vec<RgbaImage> = set.images().iter().map(|i| i.pixels().clone()).collect();
        let p = LayoutParameters::new(ArrangementMode::Grid).border_slider(50.0);
        render_images(set.images(), &p).unwrap();
        for (img, old) in set.images().iter().zip(&before) {
            assert_eq!(img.pixels(), old);
        }
    }

    #[test]
    fn count_mismatch() {
        let set = set(&[(2, 2, RED), (2, 2, RED), (2, 2, RED)]);
        let layout = compute_layout(
            &[Size::new(2, 2), Size::new(2, 2)],
            &LayoutParameters::default(),
        )
        .unwrap();
        assert_eq!(
            render(&layout, set.images(), &LayoutParameters::default()).unwrap_err(),
            RenderError::ImageCountMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn placement_index_out_of_range() {
        let set = set(&[(2, 2, RED), (2, 2, RED)]);
        let mut layout = compute_layout(
            &[Size::new(2, 2), Size::new(2, 2)],
            &LayoutParameters::default(),
        )
        .unwrap();
        layout.placements[1].index = 5;
        assert_eq!(
            render(&layout, set.images(), &LayoutParameters::default()).unwrap_err(),
            RenderError::PlacementOutOfRange { index: 5, count: 2 }
        );
    }

    #[test]
    fn too_few_images_is_a_layout_error() {
        let set = set(&[(2, 2, RED)]);
        assert_eq!(
            render_images(set.images(), &LayoutParameters::default()).unwrap_err(),
            RenderError::Layout(LayoutError::InsufficientInput { count: 1 })
        );
    }

    #[test]
    fn oversized_canvas_is_refused() {
        let layout = compute_layout(
            &[Size::new(30_000, 10), Size::new(30_000, 10)],
            &LayoutParameters::default(),
        )
        .unwrap();
        let set = set(&[(1, 1, RED), (1, 1, RED)]);
        assert!(matches!(
            render(&layout, set.images(), &LayoutParameters::default()),
            Err(RenderError::CanvasTooLarge { .. })
        ));
        assert!(check_canvas(Size::new(16_384, 16_384)).is_ok());
        assert!(check_canvas(Size::new(16_385, 16_384)).is_err());
    }

    #[test]
    fn cross_origin_taints() {
        let mut s = set(&[(2, 2, RED)]);
        s.push_decoded("remote.png", Origin::CrossOrigin, RgbaImage::from_pixel(2, 2, BLUE))
            .unwrap();
        let (_, out) = render_images(s.images(), &LayoutParameters::default()).unwrap();
        assert!(out.is_tainted());
    }
}
