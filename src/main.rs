//! Leafscan CLI
//!
//! Operator entry point for the leaf disease classifier: run inference
//! on an image (or a directory of images), or generate care advice for
//! a known disease.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use leafscan::advice::{AdviceReply, GeminiClient, GeminiConfig, DEFAULT_MODEL};
use leafscan::backend::{backend_name, default_device, DefaultBackend};
use leafscan::inference::Predictor;
use leafscan::utils::logging::{init_logging, LogConfig};

/// Leafscan - plant disease classification and care advice
#[derive(Parser, Debug)]
#[command(name = "leafscan")]
#[command(version)]
#[command(about = "Plant leaf disease classification with care advice", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run inference on a single image or a directory of images
    Infer {
        /// Path to input image or directory
        #[arg(short, long)]
        input: String,

        /// Path to the model checkpoint
        #[arg(short, long, env = "LEAFSCAN_MODEL")]
        model: String,
    },

    /// Generate care advice for a detected disease
    Advise {
        /// Disease label, e.g. "Tomato___Late_blight"
        #[arg(short, long)]
        disease: String,

        /// Observed symptoms, free text
        #[arg(short, long)]
        symptoms: Option<String>,

        /// Generative model to use
        #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Infer { input, model } => run_infer(&input, &model),
        Commands::Advise {
            disease,
            symptoms,
            model,
        } => run_advise(&disease, symptoms.as_deref(), &model).await,
    }
}

fn run_infer(input: &str, model: &str) -> Result<()> {
    info!("Backend: {}", backend_name());

    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::load(Path::new(model), &device)
        .with_context(|| format!("Failed to load model from {}", model))?;

    let input_path = Path::new(input);
    if input_path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(input_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_image_file(p))
            .collect();
        entries.sort();

        if entries.is_empty() {
            bail!("No images found in {}", input);
        }

        for path in entries {
            match predictor.predict_file(&path) {
                Ok(result) => {
                    println!("{}", format!("{:?}", path).cyan());
                    println!("{}", result.display());
                }
                Err(e) => eprintln!("{} {:?}: {}", "Skipping".yellow(), path, e),
            }
        }
    } else {
        let result = predictor.predict_file(input_path)?;
        println!("{}", result.display());
    }

    Ok(())
}

async fn run_advise(disease: &str, symptoms: Option<&str>, model: &str) -> Result<()> {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => bail!("GEMINI_API_KEY is not set"),
    };

    let config = GeminiConfig::new(api_key).with_model(model);
    let client = GeminiClient::new(config)?;

    info!("Requesting advice for {}", disease);
    let reply = client.advise(disease, symptoms).await?;

    match reply {
        AdviceReply::Structured(report) => {
            println!("{}", "Explanation:".green().bold());
            println!("{}\n", report.explanation);

            print_section("Preventive Actions:", &report.preventive_actions);
            print_section("Recommended Treatments:", &report.recommended_treatments);
            print_section(
                "Environmental and Watering Advice:",
                &report.environmental_advice,
            );
        }
        AdviceReply::Unstructured(text) => {
            println!("{}", "Model reply (unstructured):".yellow().bold());
            println!("{}", text);
        }
    }

    Ok(())
}

fn print_section(title: &str, items: &[String]) {
    println!("{}", title.green().bold());
    for (idx, item) in items.iter().enumerate() {
        println!("{}. {}", idx + 1, item);
    }
    println!();
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg" | "png" | "bmp" | "webp")
    )
}
