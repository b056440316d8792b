//! Image comparison utilities for verification
//!
//! Readback images are compared against the pixels an upload is expected to produce. Mipmap
//! generation filters on the GPU, so comparisons take a per-channel tolerance.

/// Result of comparing two images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    /// Every channel is within tolerance
    Match,
    /// Images have different dimensions
    DimensionMismatch {
        /// Dimensions of the expected image
        expected: (u32, u32),
        /// Dimensions read back from the device
        actual: (u32, u32),
    },
    /// Images have matching dimensions but different pixel values
    PixelMismatch {
        /// First differing pixel in row-major order
        first: (u32, u32),
        /// Number of pixels with at least one channel out of tolerance
        count: usize,
        /// Largest channel difference seen
        max_difference: u8,
    },
}

impl CompareResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Compares two RGBA8 images pixel by pixel
///
/// # Arguments
/// * `expected` - Pixels the upload should have produced
/// * `actual` - Pixels read back from the device
/// * `tolerance` - Largest accepted per-channel difference
///
/// # Returns
/// A `CompareResult` describing the first difference, if any
pub fn compare_images(expected: &image::RgbaImage, actual: &image::RgbaImage, tolerance: u8) -> CompareResult {
    if expected.dimensions() != actual.dimensions() {
        return CompareResult::DimensionMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        };
    }

    let mut first = None;
    let mut count = 0;
    let mut max_difference = 0;
    for ((x, y, want), got) in expected.enumerate_pixels().zip(actual.pixels()) {
        let difference = want.0.iter().zip(got.0.iter()).map(|(a, b)| a.abs_diff(*b)).max().unwrap_or(0);
        if difference > tolerance {
            first.get_or_insert((x, y));
            count += 1;
        }
        max_difference = max_difference.max(difference);
    }

    match first {
        None => CompareResult::Match,
        Some(first) => CompareResult::PixelMismatch { first, count, max_difference },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> image::RgbaImage {
        image::RgbaImage::from_pixel(width, height, image::Rgba(pixel))
    }

    #[test]
    fn test_exact_match() {
        let image = solid(2, 2, [1, 2, 3, 4]);
        assert_eq!(compare_images(&image, &image.clone(), 0), CompareResult::Match);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = compare_images(&solid(2, 2, [0; 4]), &solid(4, 2, [0; 4]), 0);
        assert_eq!(
            result,
            CompareResult::DimensionMismatch {
                expected: (2, 2),
                actual: (4, 2)
            }
        );
    }

    #[test]
    fn test_tolerance() {
        let expected = solid(2, 1, [100, 100, 100, 255]);
        let mut actual = expected.clone();
        actual.put_pixel(1, 0, image::Rgba([101, 100, 98, 255]));

        assert_eq!(compare_images(&expected, &actual, 2), CompareResult::Match);
        assert_eq!(
            compare_images(&expected, &actual, 1),
            CompareResult::PixelMismatch {
                first: (1, 0),
                count: 1,
                max_difference: 2
            }
        );
    }
}
