//! Image variant generation
//!
//! Decoding, resizing and encoding are CPU bound; [`generate_variants`]
//! runs the whole sequence on the blocking thread pool.

use super::MediaError;
use bml_shared::media::{variant_file_name, Variant, VARIANTS};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// One file written by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub variant: Variant,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
    pub filename: String,
}

/// Output size for a variant
///
/// Never upscales: a target at or above the source width keeps the source
/// size. Otherwise the height follows the aspect ratio and is at least 1.
pub fn target_dimensions(src_width: u32, src_height: u32, target: Option<u32>) -> (u32, u32) {
    match target {
        Some(width) if width < src_width => {
            let height = (src_height as f64 * width as f64 / src_width as f64).round();
            (width, height.max(1.0) as u32)
        }
        _ => (src_width, src_height),
    }
}

/// Flatten any alpha onto white and convert to 8-bit RGB
pub fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    out
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, MediaError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .map_err(MediaError::Encode)?;
    Ok(buf)
}

/// Synchronous body of [`generate_variants`]
pub fn generate_variants_blocking(
    bytes: &[u8],
    base: &str,
    dest: &Path,
    quality: u8,
) -> Result<Vec<GeneratedVariant>, MediaError> {
    let decoded = image::load_from_memory(bytes).map_err(MediaError::Decode)?;
    let source = flatten_to_rgb(decoded);
    let (src_width, src_height) = source.dimensions();

    std::fs::create_dir_all(dest)?;

    let mut generated = Vec::with_capacity(VARIANTS.len());
    for variant in VARIANTS {
        let (width, height) = target_dimensions(src_width, src_height, variant.target_width());
        let encoded = if (width, height) == (src_width, src_height) {
            encode_jpeg(&source, quality)?
        } else {
            let resized = image::imageops::resize(&source, width, height, FilterType::Lanczos3);
            encode_jpeg(&resized, quality)?
        };

        let filename = variant_file_name(base, variant);
        let path = dest.join(&filename);
        std::fs::write(&path, encoded)?;

        generated.push(GeneratedVariant {
            variant,
            width,
            height,
            path,
            filename,
        });
    }

    Ok(generated)
}

/// Decode `bytes` and write every variant to `{dest}/{base}_{variant}.jpg`
///
/// Returns the variants in table order.
pub async fn generate_variants(
    bytes: Vec<u8>,
    base: String,
    dest: PathBuf,
    quality: u8,
) -> Result<Vec<GeneratedVariant>, MediaError> {
    tokio::task::spawn_blocking(move || generate_variants_blocking(&bytes, &base, &dest, quality))
        .await
        .map_err(|e| MediaError::Io(std::io::Error::other(e)))?
}
