// src/transforms/images.rs

//! Lossless-ish image re-encoding via the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::errors::TransformError;
use crate::pipeline::{SourceFile, Transform};

pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Re-encode PNG and JPEG files; keep the original bytes unless the
/// re-encoded file is smaller. Other formats pass through untouched.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimize {
    pub jpeg_quality: u8,
}

impl Default for ImageOptimize {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageOptimize {
    fn reencode(&self, bytes: &[u8], format: ImageFormat) -> image::ImageResult<Vec<u8>> {
        let img = image::load_from_memory_with_format(bytes, format)?;
        let mut out = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
            }
            _ => {
                let encoder = PngEncoder::new_with_quality(
                    &mut out,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
            }
        }
        Ok(out)
    }
}

impl Transform for ImageOptimize {
    fn name(&self) -> &str {
        "image-optimize"
    }

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        let format = match image::guess_format(&file.contents) {
            Ok(f @ (ImageFormat::Png | ImageFormat::Jpeg)) => f,
            _ => {
                debug!(path = %file.path.display(), "not a PNG/JPEG; copying as is");
                return Ok(file);
            }
        };

        let optimized = self
            .reencode(&file.contents, format)
            .map_err(|e| TransformError::new(self.name(), &file.path, e))?;

        if optimized.len() < file.contents.len() {
            Ok(file.with_contents(optimized))
        } else {
            Ok(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_fn(32, 32, |x, _| Rgb([(x * 8) as u8, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn never_grows_a_file() {
        let original = png_bytes();
        let out = ImageOptimize::default()
            .apply(SourceFile::new("a.png", original.clone()))
            .unwrap();
        assert!(out.contents.len() <= original.len());
        assert!(image::load_from_memory(&out.contents).is_ok());
    }

    #[test]
    fn unknown_formats_pass_through() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();
        let out = ImageOptimize::default()
            .apply(SourceFile::new("icon.svg", svg.clone()))
            .unwrap();
        assert_eq!(out.contents, svg);
    }

    #[test]
    fn corrupt_png_is_rejected() {
        let mut bytes = png_bytes();
        bytes.truncate(40);
        let err = ImageOptimize::default()
            .apply(SourceFile::new("bad.png", bytes))
            .unwrap_err();
        assert_eq!(err.step, "image-optimize");
    }
}
