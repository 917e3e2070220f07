//! Client-side image optimization: bounded downscale plus JPEG re-encode.
use std::sync::Arc;

use image::ImageError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;

/// Longer side of images sent to the backend.
pub const UPLOAD_MAX_SIDE: u32 = 1200;
/// JPEG quality of images sent to the backend.
pub const UPLOAD_QUALITY: u8 = 70;
/// Longer side of preview thumbnails.
pub const PREVIEW_MAX_SIDE: u32 = 200;
/// JPEG quality of preview thumbnails.
pub const PREVIEW_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("failed to decode image")]
    Decode(#[source] ImageError),
    #[error("failed to encode image")]
    Encode(#[source] ImageError),
    #[error("image processing task was interrupted")]
    Interrupted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OptimizeOptions {
    pub max_side: u32,
    pub quality: u8,
}

impl OptimizeOptions {
    pub fn upload() -> Self {
        Self {
            max_side: UPLOAD_MAX_SIDE,
            quality: UPLOAD_QUALITY,
        }
    }

    pub fn preview() -> Self {
        Self {
            max_side: PREVIEW_MAX_SIDE,
            quality: PREVIEW_QUALITY,
        }
    }
}

/// Target size keeping the aspect ratio, with the longer side at most `max_side`.
///
/// Images already within bounds keep their size.
pub fn target_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let scale = |side: u32, long: u32| -> u32 {
        let scaled = (f64::from(side) * f64::from(max_side) / f64::from(long)).round();
        (scaled as u32).max(1)
    };

    if width > height && width > max_side {
        (max_side, scale(height, width))
    } else if height >= width && height > max_side {
        (scale(width, height), max_side)
    } else {
        (width, height)
    }
}

/// Decode, downscale and re-encode an image as JPEG.
pub fn optimize(bytes: &[u8], options: OptimizeOptions) -> Result<Vec<u8>, OptimizeError> {
    let source = image::load_from_memory(bytes).map_err(OptimizeError::Decode)?;
    let (source_width, source_height) = (source.width(), source.height());
    let (width, height) = target_dimensions(source_width, source_height, options.max_side);

    let resized = if (width, height) == (source_width, source_height) {
        source
    } else {
        source.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, options.quality)
        .encode_image(&rgb)
        .map_err(OptimizeError::Encode)?;

    log::debug!(
        "optimized image {}x{} -> {}x{}, {} -> {} bytes",
        source_width,
        source_height,
        width,
        height,
        bytes.len(),
        out.len()
    );
    Ok(out)
}

/// Run [`optimize`] on the blocking pool.
pub async fn optimize_async(
    bytes: Arc<[u8]>,
    options: OptimizeOptions,
) -> Result<Vec<u8>, OptimizeError> {
    tokio::task::spawn_blocking(move || optimize(&bytes, options))
        .await
        .map_err(|_| OptimizeError::Interrupted)?
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_is_bounded_by_width() {
        assert_eq!(target_dimensions(2400, 1600, 1200), (1200, 800));
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        assert_eq!(target_dimensions(1000, 3000, 1200), (400, 1200));
    }

    #[test]
    fn square_and_small_images() {
        assert_eq!(target_dimensions(1500, 1500, 1200), (1200, 1200));
        assert_eq!(target_dimensions(640, 480, 1200), (640, 480));
        assert_eq!(target_dimensions(5000, 2, 200), (200, 1));
    }

    #[test]
    fn optimize_outputs_bounded_jpeg() {
        let input = test_images::png(2400, 1200);
        let output = optimize(&input, OptimizeOptions::upload()).unwrap();

        assert_eq!(image::guess_format(&output).unwrap(), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 600));
    }

    #[test]
    fn optimize_rejects_garbage() {
        let err = optimize(b"definitely not an image", OptimizeOptions::upload()).unwrap_err();
        assert!(matches!(err, OptimizeError::Decode(_)));
    }

    #[tokio::test]
    async fn optimize_async_builds_preview() {
        let input: Arc<[u8]> = test_images::png(300, 600).into();
        let output = optimize_async(input, OptimizeOptions::preview()).await.unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 200));
    }
}
