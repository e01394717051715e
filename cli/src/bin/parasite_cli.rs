use clap::{Parser, Subcommand};
use cli::{AnalysisConfig, CliError, LinearModel};
use color_eyre::eyre::Result;
use parasite::{Pipeline, Report};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect parasites in a single image
    Analyze {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Classifier model, overrides 'model_path' from the configuration
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Where to save the padded image with detection boxes
        #[arg(long)]
        output_image: Option<PathBuf>,
        /// Where to write the JSON report (stdout if omitted)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            input,
            config,
            model,
            output_image,
            report,
        } => {
            analyze(
                input,
                config.as_deref(),
                model.as_deref(),
                output_image.as_deref(),
                report.as_deref(),
            )?;
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(AnalysisConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn analyze(
    input: &Path,
    config_path: Option<&Path>,
    model_path: Option<&Path>,
    output_image: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    let model_path = model_path
        .or(config.model_path.as_deref())
        .ok_or(CliError::MissingModel)?;
    let model = LinearModel::from_file(model_path)?;
    info!("Loaded classifier from {}", model_path.display());

    let pipeline = Pipeline::builder()
        .with_config(config.detector.clone())
        .build(Arc::new(model))?;
    info!("{}", pipeline.info());

    let analysis = pipeline.analyze_path(input)?;

    let report = Report::from([(config.element_name.clone(), analysis.detections.clone())]);
    let json = serde_json::to_string_pretty(&report)?;
    match report_path {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = output_image {
        analysis.save_annotated(path)?;
        info!("Annotated image written to {}", path.display());
    }

    info!(
        "✅ {} detection(s) in {}",
        analysis.detections.len(),
        input.display()
    );
    Ok(())
}
