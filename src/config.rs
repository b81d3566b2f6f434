use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoOp, MatteError, Result};
use crate::pixels::SubPixel;

/// Thresholds and sizes for one matting run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ProcessingParameters {
    /// Minimum value on every RGB channel for the near-white rule.
    pub rgb_min: SubPixel,
    /// Minimum HSV value for the bright/desaturated rule.
    pub v_min: f32,
    /// Maximum HSV saturation for the bright/desaturated rule.
    pub s_max: f32,
    /// Gaussian sigma applied to the alpha plane, 0 disables feathering.
    pub feather_radius: f32,
    /// Border kept around the content box after trimming.
    pub pad: u32,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            rgb_min: 240,
            v_min: 0.95,
            s_max: 0.20,
            feather_radius: 1.0,
            pad: 1,
        }
    }
}

impl ProcessingParameters {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &'static str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(MatteError::InvalidParameter {
                    name,
                    reason: format!("{value} is outside [0, 1]"),
                })
            }
        };
        unit("v_min", self.v_min)?;
        unit("s_max", self.s_max)?;

        if !self.feather_radius.is_finite() || self.feather_radius < 0.0 {
            return Err(MatteError::InvalidParameter {
                name: "feather_radius",
                reason: format!("{} is not a non-negative number", self.feather_radius),
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Stop at the first failing file instead of collecting failures.
    pub fail_fast: bool,
    pub parameters: ProcessingParameters,
}

pub fn parse_config(config_data: &str) -> Result<BatchConfig> {
    let config: BatchConfig = toml::from_str(config_data)?;
    config.parameters.validate()?;
    Ok(config)
}

pub fn load_config(config_path: impl AsRef<Path>) -> Result<BatchConfig> {
    let config_path = config_path.as_ref();
    let data_string = std::fs::read_to_string(config_path)
        .map_err(|e| MatteError::io(IoOp::Read, config_path, e))?;
    parse_config(&data_string)
}
