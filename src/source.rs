//! Image source adapter: MIME allowlist, decoding, and the ordered working set.
//!
//! The layout and compositing code never decodes anything itself. Blobs go
//! through a [`Decode`] implementation here, and only successfully decoded
//! images ever enter an [`ImageSet`]. A failed decode is reported on its own
//! and never blocks the rest of the batch.
//!
//! # Example
//!
//! ```
//! use zencompose::source::{ImageDecoder, ImageSet, SourceBlob};
//!
//! let mut set = ImageSet::new();
//! let failures = set.add_all(
//!     &[SourceBlob::new("notes.txt", "text/plain", b"hello".to_vec())],
//!     &ImageDecoder,
//! );
//! assert_eq!(failures.len(), 1);
//! assert!(set.is_empty());
//! ```

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageDecoder as _;
use image::metadata::Orientation;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use rand::seq::SliceRandom;

use crate::geometry::Size;

/// Accepted input formats. Everything else is rejected before decoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl SourceFormat {
    /// Look up a MIME type (`image/jpeg`, `image/png`, `image/gif`, `image/webp`).
    ///
    /// Case-insensitive; parameters after `;` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        [Self::Jpeg, Self::Png, Self::Gif, Self::WebP]
            .into_iter()
            .find(|f| essence.eq_ignore_ascii_case(f.mime()))
    }

    /// Infer from a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Canonical MIME type.
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Where a blob's bytes came from.
///
/// Drawing a cross-origin image taints the composite, and a tainted
/// composite can't be exported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Picked or dropped by the user.
    #[default]
    Local,
    /// Fetched from another origin without read-back permission.
    CrossOrigin,
}

/// An undecoded input file.
#[derive(Clone, Debug)]
pub struct SourceBlob {
    /// Display name, used for sorting and error reports.
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Provenance.
    pub origin: Origin,
}

impl SourceBlob {
    /// A local blob.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
            origin: Origin::Local,
        }
    }

    /// Read a file, inferring the MIME type from its extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which the
    /// allowlist then rejects.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceFormat::from_extension)
            .map_or("application/octet-stream", SourceFormat::mime);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime, bytes))
    }

    /// Mark this blob as cross-origin.
    pub fn cross_origin(mut self) -> Self {
        self.origin = Origin::CrossOrigin;
        self
    }

    /// The accepted format, if the declared MIME type is on the allowlist.
    pub fn format(&self) -> Option<SourceFormat> {
        SourceFormat::from_mime(&self.mime)
    }
}

/// Decoding failure for a single blob.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// MIME type not on the allowlist.
    #[error("unsupported file type {mime:?}: expected image/jpeg, image/png, image/gif or image/webp")]
    Unsupported { mime: String },
    /// The bytes are not a valid image of the declared type.
    #[error("could not decode {name:?}: {reason}")]
    Malformed { name: String, reason: String },
    /// Decoded to zero width or height.
    #[error("{name:?} decoded to an empty image")]
    Empty { name: String },
}

/// One blob that didn't make it into the working set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Name of the rejected blob.
    pub name: String,
    /// Why it was rejected.
    pub error: DecodeError,
}

/// Injected decode capability.
///
/// Implementations only ever see blobs whose MIME type passed the
/// allowlist.
pub trait Decode: Send + Sync {
    /// Decode one blob to RGBA8.
    fn decode(&self, blob: &SourceBlob) -> Result<RgbaImage, DecodeError>;
}

/// Default decoder backed by the `image` crate.
///
/// The format is sniffed from the bytes, so a PNG saved with a `.jpg` name
/// still decodes. Only when sniffing fails does the declared MIME type
/// decide. Sniffed formats outside the allowlist are rejected. EXIF
/// orientation is applied, so dimensions are as displayed.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImageDecoder;

impl Decode for ImageDecoder {
    fn decode(&self, blob: &SourceBlob) -> Result<RgbaImage, DecodeError> {
        let mut reader = ImageReader::new(Cursor::new(blob.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| malformed(blob, e))?;
        match reader.format() {
            Some(sniffed) if SourceFormat::from_image_format(sniffed).is_none() => {
                return Err(DecodeError::Unsupported {
                    mime: String::from(sniffed.to_mime_type()),
                });
            }
            Some(_) => {}
            None => {
                let declared = blob.format().ok_or_else(|| DecodeError::Unsupported {
                    mime: blob.mime.clone(),
                })?;
                reader.set_format(declared.image_format());
            }
        }

        let mut decoder = reader.into_decoder().map_err(|e| malformed(blob, e))?;
        // A broken Exif block shouldn't sink an otherwise good image.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(|e| malformed(blob, e))?;
        image.apply_orientation(orientation);
        Ok(image.to_rgba8())
    }
}

fn malformed(blob: &SourceBlob, error: impl fmt::Display) -> DecodeError {
    DecodeError::Malformed {
        name: blob.name.clone(),
        reason: error.to_string(),
    }
}

/// Stable handle for an image in an [`ImageSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// A decoded source image. Immutable; clones share the pixel buffer.
#[derive(Clone)]
pub struct DecodedImage {
    id: ImageId,
    name: String,
    origin: Origin,
    pixels: Arc<RgbaImage>,
}

impl DecodedImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixel dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Decoded RGBA8 pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("size", &self.size())
            .finish()
    }
}

/// The ordered working set of decoded images.
///
/// Order is the composite's left-to-right / top-to-bottom / row-major
/// order. It only changes through the explicit reordering methods.
#[derive(Clone, Debug, Default)]
pub struct ImageSet {
    images: Vec<DecodedImage>,
    next_id: u64,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a batch and append the successes in input order.
    ///
    /// Blobs outside the MIME allowlist are rejected without reaching the
    /// decoder. With the `parallel` feature decoding runs on the rayon
    /// pool; completion order never affects the resulting order.
    pub fn add_all<D: Decode>(&mut self, blobs: &[SourceBlob], decoder: &D) -> Vec<DecodeFailure> {
        #[cfg(feature = "parallel")]
        let results: Vec<Result<RgbaImage, DecodeError>> = {
            use rayon::prelude::*;
            blobs.par_iter().map(|b| decode_checked(b, decoder)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<RgbaImage, DecodeError>> =
            blobs.iter().map(|b| decode_checked(b, decoder)).collect();

        let mut failures = Vec::new();
        for (blob, result) in blobs.iter().zip(results) {
            match result {
                Ok(pixels) => {
                    self.insert(blob.name.clone(), blob.origin, pixels);
                }
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(name = %blob.name, %error, "image rejected");
                    failures.push(DecodeFailure {
                        name: blob.name.clone(),
                        error,
                    });
                }
            }
        }
        failures
    }

    /// Decode and append a single blob.
    pub fn add<D: Decode>(&mut self, blob: &SourceBlob, decoder: &D) -> Result<ImageId, DecodeError> {
        let pixels = decode_checked(blob, decoder)?;
        Ok(self.insert(blob.name.clone(), blob.origin, pixels))
    }

    /// Append pixels that were decoded elsewhere.
    ///
    /// Returns `None` for an empty image, which can't take part in a layout.
    pub fn push_decoded(
        &mut self,
        name: impl Into<String>,
        origin: Origin,
        pixels: RgbaImage,
    ) -> Option<ImageId> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(self.insert(name.into(), origin, pixels))
    }

    fn insert(&mut self, name: String, origin: Origin, pixels: RgbaImage) -> ImageId {
        let id = ImageId(self.next_id);
        self.next_id += 1;
        self.images.push(DecodedImage {
            id,
            name,
            origin,
            pixels: Arc::new(pixels),
        });
        id
    }

    /// Remove an image, returning it if it was present.
    pub fn remove(&mut self, id: ImageId) -> Option<DecodedImage> {
        let pos = self.images.iter().position(|img| img.id == id)?;
        Some(self.images.remove(pos))
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn get(&self, id: ImageId) -> Option<&DecodedImage> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Whether there are enough images to combine.
    pub fn is_ready(&self) -> bool {
        self.images.len() >= 2
    }

    /// Images in composite order.
    pub fn images(&self) -> &[DecodedImage] {
        &self.images
    }

    /// Dimensions in composite order.
    pub fn sizes(&self) -> Vec<Size> {
        self.images.iter().map(DecodedImage::size).collect()
    }

    /// Sort by name, A to Z. Case-insensitive, stable.
    pub fn sort_by_name_ascending(&mut self) {
        self.images.sort_by(|a, b| compare_names(&a.name, &b.name));
    }

    /// Sort by name, Z to A. Case-insensitive, stable.
    pub fn sort_by_name_descending(&mut self) {
        self.images.sort_by(|a, b| compare_names(&b.name, &a.name));
    }

    pub fn reverse(&mut self) {
        self.images.reverse();
    }

    /// Random order, e.g. `set.shuffle(&mut rand::rng())`.
    pub fn shuffle<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.images.shuffle(rng);
    }
}

fn decode_checked<D: Decode>(blob: &SourceBlob, decoder: &D) -> Result<RgbaImage, DecodeError> {
    if blob.format().is_none() {
        return Err(DecodeError::Unsupported {
            mime: blob.mime.clone(),
        });
    }
    let pixels = decoder.decode(blob)?;
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(DecodeError::Empty {
            name: blob.name.clone(),
        });
    }
    Ok(pixels)
}

fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    fold_case(a).cmp(fold_case(b)).then_with(|| a.cmp(b))
}

fn fold_case(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}
