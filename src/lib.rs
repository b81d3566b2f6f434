//! Background removal and content trimming for generated sprite images.
//!
//! Near-white backgrounds are cut out with two per-pixel rules (near-white RGB
//! and bright/desaturated HSV), the cutout edge is feathered with a Gaussian
//! blur of the alpha plane, and the result is trimmed to its content box.

pub mod batch;
pub mod config;
pub mod error;
pub mod feather;
pub mod mask;
pub mod matte;
pub mod pipeline;
pub mod pixels;
pub mod trim;

pub use batch::{process_directory, run_batch, BatchReport, FileFailure, ProcessedImage};
pub use config::{BatchConfig, ProcessingParameters};
pub use error::{IoOp, MatteError, Result};
pub use pipeline::{process_image, remove_background};
pub use trim::{trim_to_content, BoundingBox};
