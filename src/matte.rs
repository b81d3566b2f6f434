//! Alpha compositing for the background cutout.
//!
//! Opaque sources get a hard matte (background 0, everything else 1).
//! Sources that already carry transparency keep their alpha outside the
//! background so earlier cutouts survive a second pass.

use image::{Rgba, RgbaImage};
use ndarray::{Array2, Zip};

use crate::mask::BackgroundMask;
use crate::pixels::{quantize, PixelOps};

/// Normalized opacity per pixel, indexed `[[y, x]]`.
pub type AlphaMask = Array2<f32>;

pub const OPAQUE_ALPHA: f32 = 0.99;

pub fn alpha_plane(image: &RgbaImage) -> AlphaMask {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        image.get_pixel(x as u32, y as u32).0.alpha()
    })
}

pub fn is_opaque(alpha: &AlphaMask) -> bool {
    alpha.iter().all(|&a| a >= OPAQUE_ALPHA)
}

pub fn matte_alpha(source_alpha: &AlphaMask, background: &BackgroundMask) -> AlphaMask {
    let hard = is_opaque(source_alpha);
    Zip::from(source_alpha)
        .and(background)
        .map_collect(|&alpha, &is_background| match (is_background, hard) {
            (true, _) => 0.0,
            (false, true) => 1.0,
            (false, false) => alpha,
        })
}

/// Copies `image` with its alpha channel replaced by `alpha`.
pub fn composite(image: &RgbaImage, alpha: &AlphaMask) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Rgba([r, g, b, quantize(alpha[[y as usize, x as usize]])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&[bool]]) -> BackgroundMask {
        let width = rows[0].len();
        Array2::from_shape_vec(
            (rows.len(), width),
            rows.iter().flat_map(|row| row.iter().copied()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_hard_matte_on_opaque_source() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        image.put_pixel(1, 1, Rgba([9, 9, 9, 253]));
        let background = mask_from(&[&[true, false], &[false, false]]);

        let alpha = matte_alpha(&alpha_plane(&image), &background);

        assert_eq!(alpha[[0, 0]], 0.0);
        assert_eq!(alpha[[0, 1]], 1.0);
        // 253 counts as opaque, so it is promoted to 1.0 as well
        assert_eq!(alpha[[1, 1]], 1.0);
    }

    #[test]
    fn test_soft_preserve_keeps_existing_alpha() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]));
        image.put_pixel(1, 0, Rgba([9, 9, 9, 128]));
        let background = mask_from(&[&[false, false]]);

        let alpha = matte_alpha(&alpha_plane(&image), &background);
        let out = composite(&image, &alpha);

        assert_eq!(out.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [9, 9, 9, 128]);
    }

    #[test]
    fn test_composite_leaves_color_untouched() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([250, 251, 252, 255]));
        let alpha = Array2::zeros((1, 1));

        let out = composite(&image, &alpha);

        assert_eq!(out.get_pixel(0, 0).0, [250, 251, 252, 0]);
    }
}
