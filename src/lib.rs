//! Combine several images into one composite: deterministic auto-layout,
//! background and frame, lossless PNG export.
//!
//! The layout core is pure geometry, `no_std` + `alloc` compatible. Pixel
//! work (decoding, compositing, export) lives behind the `render` feature.
//!
//! # Modules
//!
//! - [`geometry`]: Sizes, rectangles, and opaque colors
//! - [`params`]: Arrangement mode, spacing fractions, colors, query-string parsing
//! - [`layout`]: Canvas size and per-image placement for horizontal, vertical, and grid
//! - `source`: MIME allowlist, decoding, and the ordered image set (`render`)
//! - `compose`: Paints a layout onto an RGBA canvas (`render`)
//! - `export`: PNG encoding and file naming (`render`)
//! - `session`: Recompute-on-change with stale-render rejection (`render`)
//! - `svg`: SVG preview of a layout (`svg`)
//!
//! # Example
//!
//! ```
//! use zencompose::{ArrangementMode, LayoutParameters, Size, compute_layout};
//!
//! let params = LayoutParameters::new(ArrangementMode::Grid).padding_slider(20.0);
//! let layout = compute_layout(&[Size::new(100, 100); 4], &params).unwrap();
//! assert_eq!(layout.canvas, Size::new(210, 210));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod geometry;
pub mod layout;
pub mod params;

#[cfg(feature = "render")]
pub mod compose;
#[cfg(feature = "render")]
pub mod export;
#[cfg(feature = "render")]
pub mod session;
#[cfg(feature = "render")]
pub mod source;

#[cfg(feature = "svg")]
pub mod svg;

pub use geometry::{Rect, Rgb, Size};
pub use layout::{CompositeLayout, GridShape, LayoutError, Placement, compute_layout, grid_shape};
pub use params::{
    ArrangementMode, Fraction, LayoutParameters, ParamError, ParseResult, ParseWarning,
    RawParameters,
};

#[cfg(feature = "render")]
pub use compose::{Composite, RenderError, render};
#[cfg(feature = "render")]
pub use export::{ExportError, ExportFormat};
#[cfg(feature = "render")]
pub use session::{RenderOutput, Session};
#[cfg(feature = "render")]
pub use source::{DecodeError, DecodedImage, ImageDecoder, ImageSet, SourceBlob};
