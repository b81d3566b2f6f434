use ndarray::Array2;

use crate::matte::AlphaMask;

/// Normalized 1D Gaussian with sigma `radius`, truncated at `ceil(3 * radius)`
/// taps per side and never more than `max_half`.
///
/// Returns `None` when the radius is too small to describe a blur, including
/// positive radii whose variance underflows to zero.
pub fn gaussian_kernel(radius: f32, max_half: usize) -> Option<Vec<f32>> {
    let two_sigma_squared = 2.0 * radius * radius;
    if radius.is_nan() || two_sigma_squared <= 0.0 {
        return None;
    }
    let half = (3.0 * radius).ceil().clamp(1.0, max_half.max(1) as f32) as isize;
    let weights: Vec<f32> = (-half..=half)
        .map(|offset| (-((offset * offset) as f32) / two_sigma_squared).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return None;
    }
    Some(weights.into_iter().map(|w| w / sum).collect())
}

// Mirror index into [0, len), repeating the reflection for kernels wider than the image.
#[inline]
fn reflect(pos: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let m = pos.rem_euclid(period);
    if m >= len {
        (period - m - 1) as usize
    } else {
        m as usize
    }
}

fn convolve_horizontal(plane: &AlphaMask, kernel: &[f32]) -> AlphaMask {
    let (height, width) = plane.dim();
    let half = (kernel.len() / 2) as isize;
    Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(i, &k)| plane[[y, reflect(x as isize + i as isize - half, width)]] * k)
            .sum()
    })
}

fn convolve_vertical(plane: &AlphaMask, kernel: &[f32]) -> AlphaMask {
    let (height, width) = plane.dim();
    let half = (kernel.len() / 2) as isize;
    Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(i, &k)| plane[[reflect(y as isize + i as isize - half, height), x]] * k)
            .sum()
    })
}

/// Softens the cutout edge. A radius of 0 returns the plane unchanged.
///
/// The kernel half-width is capped at the larger image side; the mirrored
/// edges already cover every pixel at that width.
pub fn feather(alpha: AlphaMask, radius: f32) -> AlphaMask {
    if radius <= 0.0 {
        return alpha;
    }
    let (height, width) = alpha.dim();
    let Some(kernel) = gaussian_kernel(radius, width.max(height)) else {
        log::debug!("feather radius {radius} is below the blur resolution, skipping");
        return alpha;
    };

    let temp = convolve_horizontal(&alpha, &kernel);
    convolve_vertical(&temp, &kernel)
}
