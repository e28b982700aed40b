use image::GrayImage;

use crate::{
    error::Result,
    traits::ForegroundExtractor,
    types::{Grid2D, PixelSet},
};

/// Every `[row, col]` whose value differs from `background_value`, in row-major order
pub fn extract_foreground<T: PartialEq>(mask: &Grid2D<T>, background_value: T) -> PixelSet {
    collect_where(mask, |value| *value != background_value)
}

/// Foreground of a score or logit mask: cells strictly above `threshold`
pub fn extract_foreground_above(mask: &Grid2D<f32>, threshold: f32) -> PixelSet {
    collect_where(mask, |value| *value > threshold)
}

fn collect_where<T>(mask: &Grid2D<T>, mut is_foreground: impl FnMut(&T) -> bool) -> PixelSet {
    let points = mask
        .indexed()
        .filter(|&(_, _, value)| is_foreground(value))
        .map(|(row, col, _)| [row as i64, col as i64])
        .collect::<Vec<_>>();
    PixelSet::new(points)
}

impl PixelSet {
    /// Pixels of a grayscale mask that are not `background`; y is the row, x the column
    pub fn from_gray_image(image: &GrayImage, background: u8) -> Self {
        let points = image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel[0] != background)
            .map(|(x, y, _)| [y as i64, x as i64])
            .collect::<Vec<_>>();
        PixelSet::new(points)
    }
}

/// Treats every pixel that is not `background_value` as foreground
#[derive(Debug, Clone, Default)]
pub struct BackgroundExtractor {
    pub background_value: u8,
}

impl ForegroundExtractor for BackgroundExtractor {
    fn extract_foreground(&self, image: &GrayImage) -> Result<PixelSet> {
        Ok(PixelSet::from_gray_image(image, self.background_value))
    }
}
