use std::io::Cursor;

use gio::prelude::*;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {reference}: {error}")]
    Read {
        reference: String,
        #[source]
        error: glib::Error,
    },
    #[error("{0} is empty")]
    Empty(String),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("GIF has no frames")]
    NoFrames,
}

/// Downscaled RGBA8 pixels ready to be wrapped in a texture.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Reads an image reference: a local path or any URI gio can open.
pub fn read_source(reference: &str) -> Result<Vec<u8>, LoadError> {
    let file = gio::File::for_commandline_arg(reference);
    let (bytes, _etag) = file
        .load_contents(gio::Cancellable::NONE)
        .map_err(|error| LoadError::Read {
            reference: reference.to_string(),
            error,
        })?;
    if bytes.is_empty() {
        return Err(LoadError::Empty(reference.to_string()));
    }
    Ok(bytes.to_vec())
}

/// Decodes any supported format. Animated GIFs yield their first frame.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    let format = image::guess_format(bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let frame = decoder
            .into_frames()
            .next()
            .ok_or(LoadError::NoFrames)??;
        return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
    }

    let image = match format {
        Some(fmt) => image::load_from_memory_with_format(bytes, fmt)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(image)
}

/// Decodes and fits the image within `max_edge` on its longest side.
/// Smaller images are never upscaled.
pub fn decode_rgba(bytes: &[u8], max_edge: u32) -> Result<DecodedImage, LoadError> {
    let image = decode_image(bytes)?;
    let max_edge = max_edge.max(1);
    let image = if image.width() > max_edge || image.height() > max_edge {
        image.thumbnail(max_edge, max_edge)
    } else {
        image
    };
    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        rgba: image.to_rgba8().into_raw(),
        width: width.max(1),
        height: height.max(1),
    })
}

pub fn load_source(reference: &str, max_edge: u32) -> Result<DecodedImage, LoadError> {
    let bytes = read_source(reference)?;
    decode_rgba(&bytes, max_edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_downscales_longest_edge() {
        let decoded = decode_rgba(&png_bytes(40, 20), 10).unwrap();
        assert_eq!((decoded.width, decoded.height), (10, 5));
        assert_eq!(decoded.rgba.len(), 10 * 5 * 4);
    }

    #[test]
    fn test_small_images_keep_size() {
        let decoded = decode_rgba(&png_bytes(8, 6), 1024).unwrap();
        assert_eq!((decoded.width, decoded.height), (8, 6));
        assert_eq!(&decoded.rgba[..4], &[200, 10, 10, 255]);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(matches!(
            decode_rgba(b"definitely not an image", 64),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn test_read_local_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&png_bytes(4, 4)).unwrap();
        let reference = file.path().to_string_lossy().into_owned();

        let decoded = load_source(&reference, 64).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 4));
    }

    #[test]
    fn test_missing_and_empty_sources() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            read_source(&missing.to_string_lossy()),
            Err(LoadError::Read { .. })
        ));

        let empty = dir.path().join("empty.png");
        std::fs::File::create(&empty).unwrap();
        assert!(matches!(
            read_source(&empty.to_string_lossy()),
            Err(LoadError::Empty(_))
        ));
    }
}
