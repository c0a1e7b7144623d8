use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use segeval::config::{Dataset, EvalConfig, ModelKind, Split};
use segeval::models::ImageSize;
use segeval::{dataset, segmentation};

#[derive(Parser)]
#[command(name = "segeval")]
#[command(about = "Run a pretrained segmentation network over a dataset split and write label masks")]
struct Cli {
    /// Segmentation network
    #[arg(long, value_enum, default_value_t = ModelKind::Espnetv2)]
    model: ModelKind,

    /// Network width multiplier
    #[arg(long = "s", default_value_t = 2.0)]
    scale: f32,

    /// Pretrained weight file (.rten); looked up in the model zoo when omitted
    #[arg(long = "weights-test", value_name = "FILE")]
    weights: Option<PathBuf>,

    /// Directory the model zoo paths are relative to
    #[arg(long = "dir", value_name = "DIR", default_value = "")]
    weights_dir: PathBuf,

    /// Dataset root directory
    #[arg(long, value_name = "DIR", default_value = "data/cityscapes")]
    data_path: PathBuf,

    #[arg(long, value_enum, default_value_t = Dataset::City)]
    dataset: Dataset,

    #[arg(long, value_enum, default_value_t = Split::Val)]
    split: Split,

    /// Network input size (W H)
    #[arg(long, num_args = 2, value_names = ["W", "H"], default_values_t = [1024u32, 512])]
    im_size: Vec<u32>,

    /// Number of classes (defaults to the dataset's class list)
    #[arg(long)]
    num_classes: Option<usize>,

    /// Where results directories are created
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_root: PathBuf,

    /// Evaluate only the first N images
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Write colour-indexed masks even for datasets that store raw IDs
    #[arg(long)]
    colorize: bool,

    /// Save per-stage debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<EvalConfig> {
        let [width, height] = self.im_size[..] else {
            anyhow::bail!("--im-size expects exactly two values (W H)");
        };

        Ok(EvalConfig {
            model: self.model,
            scale: self.scale,
            dataset: self.dataset,
            data_path: self.data_path,
            split: self.split,
            im_size: ImageSize::new(width, height),
            weights: self.weights,
            weights_dir: self.weights_dir,
            num_classes: self.num_classes,
            output_root: self.output_root,
            limit: self.limit,
            colorize: self.colorize,
            debug_out: self.debug_out,
            verbose: self.verbose,
        })
    }
}

fn run(config: EvalConfig) -> anyhow::Result<()> {
    config.validate()?;
    info!(
        "Evaluating {} (s={}) on {} {} at {}",
        config.model.name(),
        config.scale,
        config.dataset.name(),
        config.split.name(),
        config.im_size
    );

    let model = segmentation::load_model(&config)?;
    let image_list = dataset::load_image_list(&config)?;
    let pipeline = segmentation::build_pipeline(&config, model)?;

    let summary = segmentation::evaluate(&pipeline, &image_list, !config.verbose)?;
    info!(
        "Wrote {} masks to {}",
        summary.outputs.len(),
        config.save_dir().display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = args.into_config().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
