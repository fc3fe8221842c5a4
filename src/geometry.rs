//! Pixel geometry and color primitives shared by layout and rendering.

use core::fmt;

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either axis is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel count, widened so large canvases can't overflow.
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Dimensions without the offset.
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether this rect lies entirely inside `(0, 0, size.width, size.height)`.
    pub const fn fits_within(&self, size: Size) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }

    /// Whether the two rects share at least one pixel.
    pub const fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Opaque sRGB color, 8 bits per channel.
///
/// The composite is always drawn at full opacity, so there is no alpha.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels plus an opaque alpha, in RGBA order.
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Lowercase `#rrggbb`, the form an HTML color input reports.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.size(), Size::new(30, 40));
    }

    #[test]
    fn rect_fits_within() {
        assert!(Rect::new(0, 0, 100, 50).fits_within(Size::new(100, 50)));
        assert!(!Rect::new(1, 0, 100, 50).fits_within(Size::new(100, 50)));
    }

    #[test]
    fn rect_overlap_is_exclusive_at_edges() {
        let a = Rect::new(0, 0, 200, 100);
        let b = Rect::new(200, 0, 50, 100);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(199, 99, 5, 5)));
    }

    #[test]
    fn size_area_is_widened() {
        assert_eq!(Size::new(u32::MAX, 2).area(), u32::MAX as u64 * 2);
        assert!(Size::new(0, 5).is_empty());
    }

    #[test]
    fn rgb_display_is_lowercase_hex() {
        assert_eq!(Rgb::new(255, 128, 0).to_string(), "#ff8000");
        assert_eq!(Rgb::BLACK.to_string(), "#000000");
    }
}
