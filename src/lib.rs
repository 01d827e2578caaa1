//! Birdlens - bird species image classification behind a web form.
//!
//! A pre-trained ONNX model is loaded once at startup and shared read-only
//! by every request. Uploaded images are mapped to a probability for every
//! species in the model's label set.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod server;

use clap::Parser;
use cli::{Cli, Command, CommonArgs, ConfigAction};
use config::{
    Config, InferenceDevice, config_file_path, load_config_file, load_default_config, save_config,
};
use inference::BirdClassifier;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub use error::{Error, Result};

/// Main entry point for the birdlens CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.common.verbose, cli.common.quiet);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config { action } => handle_config_command(action, cli.common.config.as_deref()),
        Command::Serve => serve(&resolve_config(&cli.common)?),
        Command::Classify {
            images,
            top_k,
            json,
        } => classify_files(&resolve_config(&cli.common)?, &images, top_k, json),
        Command::Labels => {
            let classifier = load_classifier(&resolve_config(&cli.common)?)?;
            print_labels(&classifier);
            Ok(())
        }
    }
}

/// Load the config file and apply command-line overrides.
pub fn resolve_config(args: &CommonArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            load_config_file(path)?
        }
        None => load_default_config()?,
    };

    if let Some(model) = &args.model {
        config.model.path.clone_from(model);
    }
    if let Some(labels) = &args.labels {
        config.model.labels.clone_from(labels);
    }
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = &args.examples_dir {
        config.server.examples_dir.clone_from(dir);
    }
    if args.gpu {
        config.inference.device = InferenceDevice::Gpu;
    } else if args.cpu {
        config.inference.device = InferenceDevice::Cpu;
    }

    config::validate_config(&config)?;
    Ok(config)
}

/// Load the model named by the configuration.
///
/// Any failure here is fatal: the server never starts without a model.
fn load_classifier(config: &Config) -> Result<BirdClassifier> {
    info!("Loading model: {}", config.model.path.display());
    BirdClassifier::from_config(config)
}

fn serve(config: &Config) -> Result<()> {
    let classifier = Arc::new(load_classifier(config)?);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    runtime.block_on(server::serve(classifier, &config.server))
}

#[allow(clippy::print_stdout)]
fn classify_files(config: &Config, images: &[PathBuf], top_k: usize, json: bool) -> Result<()> {
    let classifier = load_classifier(config)?;

    let mut results = Vec::with_capacity(images.len());
    for path in images {
        let prediction = classify_file(&classifier, path)?;
        if json {
            results.push(serde_json::json!({
                "file": path.display().to_string(),
                "result": prediction.to_output(None),
            }));
        } else {
            println!("{}", path.display());
            for score in prediction.to_output(Some(top_k)).confidences {
                println!("  {:<40} {:>7.2}%", score.label, score.confidence * 100.0);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&results)
            .map_err(|source| Error::JsonSerialize { source })?;
        println!("{rendered}");
    }

    Ok(())
}

fn classify_file(classifier: &BirdClassifier, path: &Path) -> Result<inference::Prediction> {
    debug!("Classifying {}", path.display());
    let image = image::open(path)?;
    classifier.classify(&image)
}

#[allow(clippy::print_stdout)]
fn print_labels(classifier: &BirdClassifier) {
    for label in classifier.labels() {
        println!("{label}");
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT stays quiet unless verbose.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit_path: Option<&Path>) -> Result<()> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  Edit [model] path and labels to point at your model artifact");
                println!("  birdlens serve");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config_file(&path)?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
