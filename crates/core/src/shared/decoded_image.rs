use std::sync::OnceLock;

use image::{GrayImage, RgbImage};

/// A decoded still image: 3-channel RGB pixels in row-major order.
///
/// Immutable after construction. The grayscale intensity map is derived
/// on first use and cached, so the localizer and normalizer share one
/// conversion per request.
#[derive(Debug)]
pub struct DecodedImage {
    rgb: RgbImage,
    gray: OnceLock<GrayImage>,
}

impl DecodedImage {
    pub fn new(rgb: RgbImage) -> Self {
        debug_assert!(
            rgb.width() > 0 && rgb.height() > 0,
            "decoded image must not be empty"
        );
        Self {
            rgb,
            gray: OnceLock::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luminance-only view of the image (Rec. 709 weights).
    pub fn grayscale(&self) -> &GrayImage {
        self.gray
            .get_or_init(|| image::imageops::grayscale(&self.rgb))
    }
}

impl Clone for DecodedImage {
    fn clone(&self) -> Self {
        Self::new(self.rgb.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_construction_and_accessors() {
        let image = DecodedImage::new(RgbImage::new(4, 2));
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 2);
        assert_eq!(image.rgb().as_raw().len(), 4 * 2 * 3);
    }

    #[test]
    fn test_grayscale_has_same_dimensions() {
        let image = DecodedImage::new(RgbImage::new(7, 3));
        let gray = image.grayscale();
        assert_eq!(gray.dimensions(), (7, 3));
    }

    #[test]
    fn test_grayscale_is_monotonic_in_brightness() {
        let dark = DecodedImage::new(RgbImage::from_pixel(1, 1, Rgb([40, 40, 40])));
        let bright = DecodedImage::new(RgbImage::from_pixel(1, 1, Rgb([200, 200, 200])));
        assert!(dark.grayscale()[(0, 0)][0] < bright.grayscale()[(0, 0)][0]);
    }

    #[test]
    fn test_grayscale_of_neutral_gray_is_unchanged() {
        let image = DecodedImage::new(RgbImage::from_pixel(2, 2, Rgb([128, 128, 128])));
        assert!(image.grayscale().pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn test_grayscale_is_cached() {
        let image = DecodedImage::new(RgbImage::new(2, 2));
        let first = image.grayscale() as *const GrayImage;
        let second = image.grayscale() as *const GrayImage;
        assert_eq!(first, second);
    }

    #[test]
    fn test_clone_is_independent_of_cache() {
        let image = DecodedImage::new(RgbImage::from_pixel(3, 3, Rgb([10, 20, 30])));
        let _ = image.grayscale();
        let cloned = image.clone();
        assert_eq!(cloned.rgb(), image.rgb());
        assert_eq!(cloned.grayscale(), image.grayscale());
    }

    #[test]
    #[should_panic(expected = "decoded image must not be empty")]
    fn test_empty_image_panics_in_debug() {
        DecodedImage::new(RgbImage::new(0, 0));
    }
}
