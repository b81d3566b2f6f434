//! Directory-level replace-in-place of sprite images.
//!
//! Every recognized image directly inside the directory is decoded, matted,
//! trimmed and written back as PNG under `{width}x{height}_{name}`. The source
//! is only deleted once the new file has been flushed and synced. An existing
//! file at the output name is never overwritten.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{BatchConfig, ProcessingParameters};
use crate::error::{IoOp, MatteError, Result};
use crate::pipeline::process_image;

pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    /// `dir_name/file_name`, the form game pages use to reference the sprite.
    pub fn asset_reference(&self) -> String {
        let file_name = self.output.file_name().unwrap_or_default().to_string_lossy();
        match self.output.parent().and_then(Path::file_name) {
            Some(parent) => format!("{}/{}", parent.to_string_lossy(), file_name),
            None => file_name.into_owned(),
        }
    }
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: MatteError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedImage>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn output_paths(&self) -> Vec<&Path> {
        self.processed.iter().map(|p| p.output.as_path()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Regular files directly inside `dir` with a recognized image extension, sorted.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| MatteError::io(IoOp::ReadDir, dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MatteError::io(IoOp::ReadDir, dir, e))?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

pub fn output_path(source: &Path, width: u32, height: u32) -> PathBuf {
    let mut name = OsString::from(format!("{width}x{height}_"));
    name.push(source.file_name().unwrap_or_default());
    source.with_file_name(name)
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let bytes = fs::read(path).map_err(|e| MatteError::io(IoOp::Read, path, e))?;
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MatteError::io(IoOp::Read, path, e))?
        .decode()
        .map_err(|source| MatteError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates `path`, which must not exist yet, and fills it through `write`.
///
/// The file is flushed and synced before returning. On any failure after the
/// file was created it is removed again, so no truncated output is left behind.
fn write_new_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| MatteError::io(IoOp::Write, path, e))?;

    let written = fill_and_sync(file, path, write);
    if written.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial output {}: {}", path.display(), e);
        }
    }
    written
}

fn fill_and_sync(
    file: File,
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .map_err(|e| MatteError::io(IoOp::Write, path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| MatteError::io(IoOp::Write, path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| MatteError::io(IoOp::Write, path, e))
}

/// Writes `image` as a new PNG file and syncs it to disk before returning.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    write_new_file(path, |writer| {
        PngEncoder::new(writer)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|source| MatteError::Encode {
                path: path.to_path_buf(),
                source,
            })
    })
}

/// Processes one file and replaces it with its trimmed PNG.
///
/// If the source cannot be deleted the new file is kept and the delete error is returned.
pub fn process_file(path: &Path, params: &ProcessingParameters) -> Result<ProcessedImage> {
    replace_file(path, params, save_png, |source| fs::remove_file(source))
}

fn replace_file(
    path: &Path,
    params: &ProcessingParameters,
    save: impl FnOnce(&RgbaImage, &Path) -> Result<()>,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<ProcessedImage> {
    let now = Instant::now();
    let image = load_image(path)?;
    let result = process_image(&image, params);
    let (width, height) = result.dimensions();

    let output = output_path(path, width, height);
    save(&result, &output)?;
    remove_source(path).map_err(|e| MatteError::io(IoOp::Delete, path, e))?;

    log::info!(
        "{} -> {} ({}x{}) in {:.2?}",
        path.display(),
        output.display(),
        width,
        height,
        now.elapsed()
    );

    Ok(ProcessedImage {
        source: path.to_path_buf(),
        output,
        width,
        height,
    })
}

/// Fail-soft batch with the given parameters.
pub fn process_directory(dir: &Path, params: &ProcessingParameters) -> Result<BatchReport> {
    let config = BatchConfig {
        fail_fast: false,
        parameters: *params,
    };
    run_batch(dir, &config)
}

/// Runs the batch over `dir`.
///
/// Fail-soft runs collect per-file failures in the report. Fail-fast runs go
/// file by file and return the first failure as [`MatteError::Aborted`], which
/// still lists the files replaced before it.
pub fn run_batch(dir: &Path, config: &BatchConfig) -> Result<BatchReport> {
    let params = config.parameters;
    params.validate()?;

    let images = list_images(dir)?;
    log::info!("found {} images in {}", images.len(), dir.display());

    let mut report = BatchReport::default();

    if config.fail_fast {
        for path in &images {
            match process_file(path, &params) {
                Ok(processed) => report.processed.push(processed),
                Err(error) => {
                    return Err(MatteError::Aborted {
                        path: path.clone(),
                        processed: report.processed,
                        source: Box::new(error),
                    })
                }
            }
        }
        return Ok(report);
    }

    #[cfg(feature = "parallel")]
    let results: Vec<(PathBuf, Result<ProcessedImage>)> = images
        .par_iter()
        .map(|path| (path.clone(), process_file(path, &params)))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<(PathBuf, Result<ProcessedImage>)> = images
        .iter()
        .map(|path| (path.clone(), process_file(path, &params)))
        .collect();

    for (path, result) in results {
        match result {
            Ok(processed) => report.processed.push(processed),
            Err(error) => {
                log::warn!("skipping {}: {}", path.display(), error);
                report.failures.push(FileFailure { path, error });
            }
        }
    }

    log::info!(
        "processed {} images, {} failed",
        report.processed.len(),
        report.failures.len()
    );
    Ok(report)
}
