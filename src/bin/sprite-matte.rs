use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser as Clap_parser;
use sprite_matte::config::{load_config, BatchConfig};
use sprite_matte::{run_batch, MatteError, ProcessedImage};

#[derive(Clap_parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// directory holding the generated sprites
    #[arg(value_name = "DIR")]
    image_dir: PathBuf,

    /// TOML config with a [parameters] table
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    rgb_min: Option<u8>,

    #[arg(long)]
    v_min: Option<f32>,

    #[arg(long)]
    s_max: Option<f32>,

    /// gaussian sigma for edge feathering, 0 disables it
    #[arg(long)]
    feather: Option<f32>,

    #[arg(long)]
    pad: Option<u32>,

    /// stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,
}

impl Args {
    fn batch_config(&self) -> sprite_matte::Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BatchConfig::default(),
        };
        let params = &mut config.parameters;
        if let Some(v) = self.rgb_min {
            params.rgb_min = v;
        }
        if let Some(v) = self.v_min {
            params.v_min = v;
        }
        if let Some(v) = self.s_max {
            params.s_max = v;
        }
        if let Some(v) = self.feather {
            params.feather_radius = v;
        }
        if let Some(v) = self.pad {
            params.pad = v;
        }
        config.fail_fast |= self.fail_fast;
        Ok(config)
    }
}

fn print_references(processed: &[ProcessedImage]) {
    for image in processed {
        println!("{} {}x{}", image.asset_reference(), image.width, image.height);
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.batch_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let now = Instant::now();
    let report = match run_batch(&args.image_dir, &config) {
        Ok(report) => report,
        Err(MatteError::Aborted {
            path,
            processed,
            source,
        }) => {
            print_references(&processed);
            eprintln!("{}: {source}", path.display());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    print_references(&report.processed);
    for failure in &report.failures {
        eprintln!("{}: {}", failure.path.display(), failure.error);
    }
    log::info!("total time: {:.2?}", now.elapsed());

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
