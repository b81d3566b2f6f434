use std::time::Instant;

use image::{DynamicImage, RgbaImage};

use crate::config::ProcessingParameters;
use crate::feather::feather;
use crate::mask::BackgroundClassifier;
use crate::matte::{alpha_plane, composite, matte_alpha};
use crate::trim::trim_to_content;

pub trait PipelineModule {
    fn process(&self, image: RgbaImage) -> RgbaImage;
    fn get_name(&self) -> String;
}

/// Background classification, alpha matte and feathering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoveBackground {
    pub params: ProcessingParameters,
}

impl PipelineModule for RemoveBackground {
    fn process(&self, image: RgbaImage) -> RgbaImage {
        remove_background(&image, &self.params)
    }

    fn get_name(&self) -> String {
        "RemoveBackground".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trim {
    pub pad: u32,
}

impl PipelineModule for Trim {
    fn process(&self, image: RgbaImage) -> RgbaImage {
        trim_to_content(&image, self.pad)
    }

    fn get_name(&self) -> String {
        "Trim".to_string()
    }
}

pub fn remove_background(image: &RgbaImage, params: &ProcessingParameters) -> RgbaImage {
    let classifier = BackgroundClassifier::new(params);
    log::debug!("background rules: {}", classifier.rule_names().join(", "));
    let background = classifier.classify(image);
    let alpha = matte_alpha(&alpha_plane(image), &background);
    let alpha = feather(alpha, params.feather_radius);
    composite(image, &alpha)
}

pub fn pipeline_modules(params: &ProcessingParameters) -> Vec<Box<dyn PipelineModule>> {
    vec![
        Box::new(RemoveBackground { params: *params }),
        Box::new(Trim { pad: params.pad }),
    ]
}

pub fn run_pixel_pipeline(
    image: RgbaImage,
    modules: &[Box<dyn PipelineModule>],
) -> RgbaImage {
    modules.iter().fold(image, |image, module| {
        let now = Instant::now();
        let image = module.process(image);
        log::debug!(
            "{} -> {}x{} in {:.2?}",
            module.get_name(),
            image.width(),
            image.height(),
            now.elapsed()
        );
        image
    })
}

/// Full in-memory transform. Inputs without alpha are treated as opaque.
pub fn process_image(image: &DynamicImage, params: &ProcessingParameters) -> RgbaImage {
    run_pixel_pipeline(image.to_rgba8(), &pipeline_modules(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn sprite_on_white(width: u32, height: u32, left: u32, top: u32, size: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (left..left + size).contains(&x) && (top..top + size).contains(&y) {
                Rgba([20, 40, 220, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn transition_band(image: &RgbaImage) -> usize {
        image
            .pixels()
            .filter(|p| p.0[3] != 0 && p.0[3] != 255)
            .count()
    }

    #[test]
    fn test_pure_white_becomes_transparent() {
        let image = sprite_on_white(4, 4, 1, 1, 2);
        let params = ProcessingParameters {
            feather_radius: 0.0,
            ..Default::default()
        };

        let out = remove_background(&image, &params);

        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 0]);
        assert_eq!(out.get_pixel(1, 1).0, [20, 40, 220, 255]);
    }

    #[test]
    fn test_rgb_without_alpha_is_opaque() {
        let mut rgb = RgbImage::from_pixel(6, 6, Rgb([255, 255, 255]));
        rgb.put_pixel(2, 3, Rgb([0, 0, 0]));
        let params = ProcessingParameters {
            feather_radius: 0.0,
            pad: 0,
            ..Default::default()
        };

        let out = process_image(&DynamicImage::ImageRgb8(rgb), &params);

        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_existing_alpha_preserved_without_feather() {
        let mut image = sprite_on_white(6, 6, 2, 2, 2);
        image.put_pixel(2, 2, Rgba([20, 40, 220, 128]));
        let params = ProcessingParameters {
            feather_radius: 0.0,
            ..Default::default()
        };

        let out = remove_background(&image, &params);

        assert_eq!(out.get_pixel(2, 2).0[3], 128);
        assert_eq!(out.get_pixel(3, 3).0[3], 255);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_feather_widens_transition_band() {
        let image = sprite_on_white(40, 40, 15, 15, 10);
        let band = |feather_radius: f32| {
            let params = ProcessingParameters {
                feather_radius,
                ..Default::default()
            };
            transition_band(&remove_background(&image, &params))
        };

        let bands: Vec<usize> = [0.0, 1.0, 2.0, 3.0].into_iter().map(band).collect();

        assert_eq!(bands[0], 0);
        assert!(bands.windows(2).all(|w| w[0] < w[1]), "bands: {bands:?}");
    }

    #[test]
    fn test_underflowing_feather_radius_keeps_sprite() {
        let image = sprite_on_white(10, 10, 3, 3, 4);
        let params = ProcessingParameters {
            feather_radius: 1e-30,
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        let out = remove_background(&image, &params);

        assert_eq!(out.get_pixel(5, 5).0[3], 255);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_huge_feather_radius_spreads_alpha() {
        let image = sprite_on_white(10, 10, 3, 3, 4);
        for feather_radius in [1e9, f32::MAX] {
            let params = ProcessingParameters {
                feather_radius,
                ..Default::default()
            };
            assert!(params.validate().is_ok());

            let out = process_image(&DynamicImage::ImageRgba8(image.clone()), &params);

            // the kernel spans the whole plane, so every pixel gets some sprite alpha
            assert_eq!(out.dimensions(), (10, 10));
            assert!(out.pixels().all(|p| p.0[3] > 5 && p.0[3] < 255));
        }
    }

    #[test]
    fn test_second_pass_is_identity() {
        let image = sprite_on_white(20, 20, 8, 8, 4);
        let params = ProcessingParameters {
            feather_radius: 0.0,
            ..Default::default()
        };
        let modules = pipeline_modules(&params);

        let first = run_pixel_pipeline(image, &modules);
        let second = run_pixel_pipeline(first.clone(), &modules);

        assert_eq!(first.dimensions(), (6, 6));
        assert_eq!(first, second);
    }

    #[test]
    fn test_module_names() {
        let names: Vec<String> = pipeline_modules(&ProcessingParameters::default())
            .iter()
            .map(|m| m.get_name())
            .collect();
        assert_eq!(names, vec!["RemoveBackground", "Trim"]);
    }
}
