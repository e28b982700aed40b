use clap::{Parser, Subcommand, ValueEnum};
use cli::{MaskJob, OutputFormat, render_output, write_output};
use color_eyre::eyre::{Result, eyre};
use mask_polygon::{AxisOrder, CommandOutput, HullCommand, HullConfig, PolygonSet, PredictionSession};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the k-vertex hull polygon of one or more mask images
    Hull {
        /// Grayscale mask images
        #[arg(short, long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Target vertex count, overrides the configuration
        #[arg(short)]
        k: Option<usize>,
        /// Gray value treated as background, overrides the configuration
        #[arg(long)]
        background: Option<u8>,
        /// Gaussian blur sigma applied before foreground selection
        #[arg(long)]
        blur: Option<f32>,
        /// Binarize the mask at this gray value before foreground selection
        #[arg(long)]
        binarize: Option<u8>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Axis order of `json` output (`xy` or `row_col`), overrides the configuration
        #[arg(long)]
        axis_order: Option<AxisOrder>,
        /// Directory for output files; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a batch job file listing mask images
    Process {
        /// Path to the TOML or JSON job file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Reduce a JSON list of [a, b] points to a k-gon
    Points {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, default_value_t = 6)]
        k: usize,
    },
    /// Write a configuration file with every setting at its default
    InitConfig {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a JSON schema
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Command)]
        kind: SchemaKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaKind {
    Command,
    Config,
    Job,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hull {
            inputs,
            config,
            k,
            background,
            blur,
            binarize,
            format,
            axis_order,
            output,
        } => {
            let mut config = match config {
                Some(path) => HullConfig::from_file(path)?,
                None => HullConfig::default(),
            };
            if let Some(k) = k {
                config.vertex_count = k;
            }
            if let Some(background) = background {
                config.background_value = background;
            }
            if let Some(sigma) = blur {
                config.blur_sigma = Some(sigma);
            }
            if let Some(threshold) = binarize {
                config.binarize_threshold = Some(threshold);
            }
            if let Some(axis_order) = axis_order {
                config.output_axis_order = axis_order;
            }
            extract_hulls(inputs, config, format, output.as_deref()).await?;
        }
        Commands::Process { config } => {
            process_job(&config).await?;
        }
        Commands::Points { input, k } => {
            let points: Vec<[f64; 2]> = serde_json::from_str(&std::fs::read_to_string(&input)?)?;
            info!("Reducing {} points from {:?} to k = {}", points.len(), input, k);
            let session = PredictionSession::new(HullConfig::default())?;
            let output = session.execute(HullCommand::ComputeKGon { points, k })?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::InitConfig { output } => {
            HullConfig::default().to_file(&output)?;
            info!("Configuration written to {:?}", output);
        }
        Commands::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Command => HullCommand::schema(),
                SchemaKind::Config => schemars::schema_for!(HullConfig),
                SchemaKind::Job => schemars::schema_for!(MaskJob),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

/// Extract the outline of a single mask on the blocking pool
async fn extract_blocking(
    session: PredictionSession,
    path: &Path,
    k: Option<usize>,
) -> Result<PolygonSet> {
    let command = HullCommand::ExtractMask {
        path: path.to_string_lossy().to_string(),
        k,
    };
    let output = tokio::task::spawn_blocking(move || session.execute(command)).await??;
    match output {
        CommandOutput::Outline(set) => Ok(set),
        CommandOutput::Polygon(_) => Err(eyre!("unexpected point output for {:?}", path)),
    }
}

async fn extract_hulls(
    inputs: Vec<PathBuf>,
    config: HullConfig,
    format: OutputFormat,
    output_dir: Option<&Path>,
) -> Result<()> {
    let session = PredictionSession::new(config)?;
    info!("{}", session.pipeline().info());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|path| {
            let session = session.clone();
            tokio::spawn(async move {
                let result = extract_blocking(session, &path, None).await;
                (path, result)
            })
        })
        .collect();

    let order = session.config().output_axis_order;
    let mut failed = 0usize;
    for handle in handles {
        let (path, result) = handle.await?;
        match result {
            Ok(set) => {
                let destination = output_dir.map(|dir| {
                    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                    dir.join(format!("{}.{}", stem, format.extension()))
                });
                let written = render_output(&set, format, order)
                    .and_then(|rendered| write_output(&rendered, destination.as_deref()));
                if let Err(e) = written {
                    error!("Failed to write output for {:?}: {}", path, e);
                    failed += 1;
                }
            }
            Err(e) => {
                error!("Failed to extract {:?}: {}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(eyre!("{} mask(s) could not be processed", failed));
    }
    Ok(())
}

async fn process_job(job_path: &Path) -> Result<()> {
    let job = MaskJob::from_file(job_path)?;
    info!("Job with {} masks -> {}", job.masks.len(), job.output_dir);

    std::fs::create_dir_all(&job.output_dir)?;
    let session = PredictionSession::new(job.config.clone())?;
    let order = job.config.output_axis_order;

    let mut failed = 0usize;
    for mask in &job.masks {
        info!("Processing mask '{}' ({})", mask.name, mask.path);
        match extract_blocking(session.clone(), Path::new(&mask.path), mask.vertex_count).await {
            Ok(set) => {
                let destination = job.output_path(mask);
                let written = render_output(&set, job.format, order)
                    .and_then(|rendered| write_output(&rendered, Some(&destination)));
                if let Err(e) = written {
                    error!("Mask '{}' output failed: {}", mask.name, e);
                    failed += 1;
                }
            }
            Err(e) => {
                error!("Mask '{}' failed: {}", mask.name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(eyre!("{} of {} masks failed", failed, job.masks.len()));
    }
    info!("✅ Mask processing completed!");
    Ok(())
}
