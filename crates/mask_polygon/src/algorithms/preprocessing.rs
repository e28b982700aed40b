use image::GrayImage;
use crate::{error::Result, traits::ImagePreprocessor};

/// Binarizes a soft mask: pixels above `threshold` become 255, the rest 0
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 127 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.threshold))
    }
}

/// Gaussian blur, used before thresholding to knock out speckle in model output
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_threshold_binarizes() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([10u8]));
        img.put_pixel(1, 0, Luma([200u8]));
        img.put_pixel(2, 0, Luma([127u8]));
        let out = ThresholdPreprocessor::default().preprocess(&img).expect("threshold");
        assert_eq!(out.as_raw(), &vec![0u8, 255, 0]);
    }

    #[test]
    fn test_blur_keeps_dimensions() {
        let img = GrayImage::new(12, 7);
        let out = GaussianBlurPreprocessor::default().preprocess(&img).expect("blur");
        assert_eq!(out.dimensions(), (12, 7));
    }
}
