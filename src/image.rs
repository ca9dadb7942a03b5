use crate::fetch::{FetchKind, Fetcher};
use crate::refs::{ObjectReferences, RefType};
use crate::Error;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use std::path::Path;
use std::sync::Arc;

/// Prefix of references to images stored alongside the engine
pub const STORED_IMAGE_PREFIX: &str = "/api/images/";

/// Edge length, in pixels, of the blank image substituted for unreadable sources
const BLANK_SIZE: u32 = 10;

/// A decoded raster image, shared between the page tree and the document
pub type ImageHandle = Arc<Image>;

/// A raster image that will be embedded in the PDF as an image XObject
pub struct Image {
    pub image: DynamicImage,
    /// Width of the image in pixels
    pub width: f32,
    /// Height of the image in pixels
    pub height: f32,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

struct EncodeOutput {
    bytes: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl Image {
    pub fn new_raster(image: DynamicImage) -> Image {
        let width = image.width() as f32;
        let height = image.height() as f32;
        Image {
            image,
            width,
            height,
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory
    pub fn decode(bytes: &[u8]) -> Result<Image, Error> {
        Ok(Image::new_raster(image::load_from_memory(bytes)?))
    }

    /// A small white image standing in for sources that could not be read
    pub fn blank() -> Image {
        let buffer = ImageBuffer::from_pixel(BLANK_SIZE, BLANK_SIZE, Rgb([255u8, 255, 255]));
        Image::new_raster(DynamicImage::ImageRgb8(buffer))
    }

    fn encode_raster(&self) -> EncodeOutput {
        let level = CompressionLevel::DefaultLevel as u8;

        let mask = self.image.color().has_alpha().then(|| {
            let alphas: Vec<u8> = self.image.pixels().map(|p| (p.2).0[3]).collect();
            compress_to_vec_zlib(&alphas, level)
        });

        let bytes = compress_to_vec_zlib(self.image.to_rgb8().as_raw(), level);

        EncodeOutput { bytes, mask }
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, image_index: usize, writer: &mut Pdf) {
        let id = refs.gen(RefType::Image(image_index));
        let encoded = self.encode_raster();

        let mut image = writer.image_xobject(id, encoded.bytes.as_slice());
        image.filter(Filter::FlateDecode);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);

        let mask_id = encoded
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        // add a transparency mask if we have one
        if let (Some(mask_id), Some(mask)) = (mask_id, encoded.mask.as_ref()) {
            let mut s_mask = writer.image_xobject(mask_id, mask.as_slice());
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }
    }
}

/// How an image value names its pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// `data:image/...;base64,...`
    DataUri(&'a str),
    /// Name of an image in the stored image directory
    Stored(&'a str),
    /// `http://` or `https://` URL
    Url(&'a str),
    Unrecognised,
}

impl<'a> ImageSource<'a> {
    /// Classify an image value by its prefix
    pub fn sniff(value: &'a str) -> ImageSource<'a> {
        let value = value.trim();
        if value.starts_with("data:image/") {
            ImageSource::DataUri(value)
        } else if let Some((_, name)) = value.split_once(STORED_IMAGE_PREFIX) {
            ImageSource::Stored(name)
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ImageSource::Url(value)
        } else {
            ImageSource::Unrecognised
        }
    }
}

/// Resolves image values to decoded images, never failing: every unreadable
/// source becomes [Image::blank].
#[derive(Debug, Clone, Copy)]
pub struct ImageLoader<'a> {
    fetcher: &'a dyn Fetcher,
    image_dir: Option<&'a Path>,
}

impl<'a> ImageLoader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, image_dir: Option<&'a Path>) -> Self {
        Self { fetcher, image_dir }
    }

    /// Load an image value, detecting its form from its prefix
    pub fn load(&self, value: &str) -> ImageHandle {
        let result = match ImageSource::sniff(value) {
            ImageSource::DataUri(uri) => decode_base64(uri),
            ImageSource::Stored(name) => self.read_stored(name),
            ImageSource::Url(url) => self.fetch(url),
            ImageSource::Unrecognised => Err(Error::Specification(format!(
                "unrecognised image source `{}`",
                abbreviate(value)
            ))),
        };
        blank_on_error(result, value)
    }

    /// Load an inline base64 payload, with or without a data URI prefix
    pub fn load_base64(&self, value: &str) -> ImageHandle {
        blank_on_error(decode_base64(value), value)
    }

    pub fn load_url(&self, url: &str) -> ImageHandle {
        blank_on_error(self.fetch(url), url)
    }

    fn fetch(&self, url: &str) -> Result<Image, Error> {
        let bytes = self
            .fetcher
            .fetch(url, FetchKind::Image)
            .map_err(|err| Error::Specification(err.to_string()))?;
        Image::decode(&bytes)
    }

    fn read_stored(&self, name: &str) -> Result<Image, Error> {
        let name = name.split(['?', '#']).next().unwrap_or_default();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(Error::Specification(format!("invalid stored image name `{name}`")));
        }
        let dir = self
            .image_dir
            .ok_or_else(|| Error::Specification("no image directory configured".to_string()))?;
        let bytes = std::fs::read(dir.join(name))?;
        Image::decode(&bytes)
    }
}

fn decode_base64(value: &str) -> Result<Image, Error> {
    let payload = match value.split_once("base64,") {
        Some((_, payload)) => payload,
        None => value,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| Error::Specification(format!("invalid base64 image: {err}")))?;
    Image::decode(&bytes)
}

fn blank_on_error(result: Result<Image, Error>, source: &str) -> ImageHandle {
    match result {
        Ok(image) => Arc::new(image),
        Err(err) => {
            log::warn!("using a blank image for `{}`: {err}", abbreviate(source));
            Arc::new(Image::blank())
        }
    }
}

/// Keep log lines readable when the source is a large data URI
fn abbreviate(value: &str) -> String {
    if value.chars().count() > 64 {
        let head: String = value.chars().take(64).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{InMemoryFetcher, OfflineFetcher};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([10u8, 20, 30]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn sniffs_sources() {
        assert!(matches!(
            ImageSource::sniff("data:image/png;base64,AAAA"),
            ImageSource::DataUri(_)
        ));
        assert_eq!(
            ImageSource::sniff("http://host/api/images/logo.png"),
            ImageSource::Stored("logo.png")
        );
        assert_eq!(
            ImageSource::sniff("https://cdn.test/a.png"),
            ImageSource::Url("https://cdn.test/a.png")
        );
        assert_eq!(ImageSource::sniff("logo.png"), ImageSource::Unrecognised);
    }

    #[test]
    fn decodes_data_uris() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(4, 3)));
        let loader = ImageLoader::new(&OfflineFetcher, None);
        let image = loader.load(&uri);
        assert_eq!((image.width, image.height), (4.0, 3.0));
    }

    #[test]
    fn failures_become_blank_images() {
        let loader = ImageLoader::new(&OfflineFetcher, None);
        for value in [
            "data:image/png;base64,not-base64!",
            "https://unreachable.test/x.png",
            "/api/images/missing.png",
            "nonsense",
        ] {
            let image = loader.load(value);
            assert_eq!((image.width, image.height), (10.0, 10.0), "{value}");
        }
    }

    #[test]
    fn reads_stored_and_fetched_images() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("logo.png"), png_bytes(7, 5)).expect("write image");
        let fetcher = InMemoryFetcher::new();
        fetcher.add("https://cdn.test/a.png", png_bytes(2, 9));
        let loader = ImageLoader::new(&fetcher, Some(dir.path()));

        let stored = loader.load("/api/images/logo.png");
        assert_eq!((stored.width, stored.height), (7.0, 5.0));
        let fetched = loader.load_url("https://cdn.test/a.png");
        assert_eq!((fetched.width, fetched.height), (2.0, 9.0));
        let escaped = loader.load("/api/images/../logo.png");
        assert_eq!((escaped.width, escaped.height), (10.0, 10.0));
    }
}
