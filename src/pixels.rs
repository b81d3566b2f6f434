pub type SubPixel = u8;
pub type Pixel = [SubPixel; CHANNELS_PER_PIXEL];

pub const CHANNELS_PER_PIXEL: usize = 4;
pub const CHANNEL_MAX: f32 = 255.0;

// Keeps saturation finite at black; black ends up with saturation 1.0.
pub const HSV_EPSILON: f32 = 1e-6;

pub trait PixelOps {
    /// HSV saturation and value, both normalized to [0, 1].
    fn saturation_value(self) -> (f32, f32);
    fn alpha(self) -> f32;
    fn is_near_white(self, rgb_min: SubPixel) -> bool;
}

impl PixelOps for Pixel {
    fn saturation_value(self) -> (f32, f32) {
        let [r, g, b, _] = self.map(|c| c as f32 / CHANNEL_MAX);
        let c_max = r.max(g).max(b);
        let c_min = r.min(g).min(b);
        let delta = c_max - c_min + HSV_EPSILON;
        let s = delta / (c_max + HSV_EPSILON);
        (s, c_max)
    }

    fn alpha(self) -> f32 {
        self[3] as f32 / CHANNEL_MAX
    }

    fn is_near_white(self, rgb_min: SubPixel) -> bool {
        let [r, g, b, _] = self;
        r >= rgb_min && g >= rgb_min && b >= rgb_min
    }
}

/// Converts a normalized opacity back to the 0-255 scale.
pub fn quantize(value: f32) -> SubPixel {
    (value.clamp(0.0, 1.0) * CHANNEL_MAX).round() as SubPixel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_value_white() {
        let (s, v) = [255, 255, 255, 255].saturation_value();
        assert_eq!(v, 1.0);
        assert!(s < 1e-5);
    }

    #[test]
    fn test_saturation_value_black() {
        let (s, v) = [0, 0, 0, 255].saturation_value();
        assert_eq!(v, 0.0);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_saturation_value_pure_red() {
        let (s, v) = [255, 0, 0, 255].saturation_value();
        assert_eq!(v, 1.0);
        assert!((s - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_near_white() {
        assert!([240, 250, 255, 255].is_near_white(240));
        assert!(![239, 250, 255, 255].is_near_white(240));
        assert!([0, 0, 0, 255].is_near_white(0));
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(128.0 / 255.0), 128);
        assert_eq!(quantize(-0.5), 0);
        assert_eq!(quantize(1.5), 255);
        assert_eq!(quantize(0.0), 0);
    }
}
