use image::RgbaImage;
use ndarray::Array2;

use crate::config::ProcessingParameters;
use crate::pixels::{Pixel, PixelOps, SubPixel};

/// Per-pixel background decision, indexed `[[y, x]]`.
pub type BackgroundMask = Array2<bool>;

/// Pixels below this normalized alpha are already cut out and never reclassified.
pub const TRANSPARENT_ALPHA: f32 = 0.01;

pub trait BackgroundRule: Sync {
    fn matches(&self, pixel: Pixel) -> bool;
    fn get_name(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearWhite {
    pub rgb_min: SubPixel,
}

impl BackgroundRule for NearWhite {
    fn matches(&self, pixel: Pixel) -> bool {
        pixel.is_near_white(self.rgb_min)
    }

    fn get_name(&self) -> String {
        "NearWhite".to_string()
    }
}

/// Bright and desaturated in HSV terms, catches off-white casts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightDesaturated {
    pub v_min: f32,
    pub s_max: f32,
}

impl BackgroundRule for BrightDesaturated {
    fn matches(&self, pixel: Pixel) -> bool {
        let (s, v) = pixel.saturation_value();
        v >= self.v_min && s <= self.s_max
    }

    fn get_name(&self) -> String {
        "BrightDesaturated".to_string()
    }
}

pub struct BackgroundClassifier {
    rules: Vec<Box<dyn BackgroundRule>>,
}

impl BackgroundClassifier {
    pub fn new(params: &ProcessingParameters) -> Self {
        Self {
            rules: vec![
                Box::new(NearWhite {
                    rgb_min: params.rgb_min,
                }),
                Box::new(BrightDesaturated {
                    v_min: params.v_min,
                    s_max: params.s_max,
                }),
            ],
        }
    }

    pub fn is_background(&self, pixel: Pixel) -> bool {
        if pixel.alpha() < TRANSPARENT_ALPHA {
            return false;
        }
        self.rules.iter().any(|rule| rule.matches(pixel))
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.get_name()).collect()
    }

    pub fn classify(&self, image: &RgbaImage) -> BackgroundMask {
        let (width, height) = image.dimensions();
        Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            self.is_background(image.get_pixel(x as u32, y as u32).0)
        })
    }
}
