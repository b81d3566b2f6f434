use image::{imageops, RgbaImage};
use itertools::{Itertools, MinMaxResult};

use crate::pixels::SubPixel;

/// Alpha values at or below this are treated as blur noise, not content.
pub const CONTENT_ALPHA: SubPixel = 5;

/// Inclusive pixel bounds, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Grows the box by `pad` on every side without leaving a `width` x `height` image.
    pub fn expand(self, pad: u32, width: u32, height: u32) -> Self {
        Self {
            left: self.left.saturating_sub(pad),
            top: self.top.saturating_sub(pad),
            right: self.right.saturating_add(pad).min(width - 1),
            bottom: self.bottom.saturating_add(pad).min(height - 1),
        }
    }
}

fn min_max(values: impl Iterator<Item = u32>) -> Option<(u32, u32)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Smallest box holding every pixel with alpha above [`CONTENT_ALPHA`].
pub fn content_bounds(image: &RgbaImage) -> Option<BoundingBox> {
    let (xs, ys): (Vec<u32>, Vec<u32>) = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel.0[3] > CONTENT_ALPHA)
        .map(|(x, y, _)| (x, y))
        .unzip();

    let (left, right) = min_max(xs.into_iter())?;
    let (top, bottom) = min_max(ys.into_iter())?;
    Some(BoundingBox {
        left,
        top,
        right,
        bottom,
    })
}

pub fn trim_to_content(image: &RgbaImage, pad: u32) -> RgbaImage {
    let Some(bounds) = content_bounds(image) else {
        log::warn!(
            "no content above alpha {} in {}x{} image, leaving it untrimmed",
            CONTENT_ALPHA,
            image.width(),
            image.height()
        );
        return image.clone();
    };
    let bounds = bounds.expand(pad, image.width(), image.height());
    imageops::crop_imm(image, bounds.left, bounds.top, bounds.width(), bounds.height()).to_image()
}
