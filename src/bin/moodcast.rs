//! Moodcast CLI - Command-line interface for the training pipeline
//!
//! Commands:
//! - train: Run the full pipeline and export both artifacts
//! - predict: Classify a raw feature vector with exported artifacts
//! - inspect: Print metadata and architecture of a model artifact

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use moodcast::exporter::{ModelExporter, DEFAULT_BOUNDS_PATH, DEFAULT_MODEL_PATH};
use moodcast::pipeline::{run_training_pipeline, PipelineConfig};
use moodcast::predictor::MoodPredictor;
use moodcast::types::{GeneratorConfig, TrainingConfig, FEATURES, NUM_FEATURES};
use moodcast::{PipelineError, MOODCAST_VERSION};

/// Moodcast - train and export on-device mood classification models
#[derive(Parser)]
#[command(name = "moodcast")]
#[command(version = MOODCAST_VERSION)]
#[command(about = "Train a mood classifier on synthetic health metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and export both artifacts
    Train {
        /// Number of synthetic samples to generate
        #[arg(long, default_value = "6000")]
        samples: usize,

        /// RNG seed for generation, labeling, and balancing
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of training epochs
        #[arg(long, default_value = "50")]
        epochs: usize,

        /// Mini-batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// Trailing fraction of samples held out for validation
        #[arg(long, default_value = "0.15")]
        validation_split: f32,

        /// Adam learning rate
        #[arg(long, default_value = "0.001")]
        learning_rate: f32,

        /// Output path for the model artifact
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model_out: PathBuf,

        /// Output path for the normalization bounds archive
        #[arg(long, default_value = DEFAULT_BOUNDS_PATH)]
        bounds_out: PathBuf,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a raw feature vector with exported artifacts
    Predict {
        /// Model artifact path
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Normalization bounds path
        #[arg(long, default_value = DEFAULT_BOUNDS_PATH)]
        bounds: PathBuf,

        /// Input file containing a JSON array of 11 features (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print metadata and architecture of a model artifact
    Inspect {
        /// Model artifact path
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MoodcastCliError> {
    match cli.command {
        Commands::Train {
            samples,
            seed,
            epochs,
            batch_size,
            validation_split,
            learning_rate,
            model_out,
            bounds_out,
            json,
        } => cmd_train(
            samples,
            seed,
            epochs,
            batch_size,
            validation_split,
            learning_rate,
            model_out,
            bounds_out,
            json,
        ),

        Commands::Predict {
            model,
            bounds,
            input,
            json,
        } => cmd_predict(&model, &bounds, &input, json),

        Commands::Inspect { model, json } => cmd_inspect(&model, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_train(
    samples: usize,
    seed: u64,
    epochs: usize,
    batch_size: usize,
    validation_split: f32,
    learning_rate: f32,
    model_out: PathBuf,
    bounds_out: PathBuf,
    json: bool,
) -> Result<(), MoodcastCliError> {
    let config = PipelineConfig {
        generator: GeneratorConfig {
            num_samples: samples,
            seed,
        },
        training: TrainingConfig {
            epochs,
            batch_size,
            validation_split,
            learning_rate,
            seed,
        },
        model_path: model_out,
        bounds_path: bounds_out,
    };

    let report = run_training_pipeline(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Moodcast Training Report");
    println!("========================");
    println!("Samples generated: {}", report.samples_generated);
    println!(
        "Class counts (raw):      happy={} neutral={} sad={} stressed={}",
        report.class_counts_raw[0],
        report.class_counts_raw[1],
        report.class_counts_raw[2],
        report.class_counts_raw[3]
    );
    println!(
        "Class counts (balanced): happy={} neutral={} sad={} stressed={}",
        report.class_counts_balanced[0],
        report.class_counts_balanced[1],
        report.class_counts_balanced[2],
        report.class_counts_balanced[3]
    );

    println!("\nTraining:");
    for stats in &report.training.epochs {
        match (stats.val_loss, stats.val_accuracy) {
            (Some(vl), Some(va)) => println!(
                "  epoch {:>3}: loss {:.4}  acc {:.3}  val_loss {:.4}  val_acc {:.3}",
                stats.epoch, stats.loss, stats.accuracy, vl, va
            ),
            _ => println!(
                "  epoch {:>3}: loss {:.4}  acc {:.3}",
                stats.epoch, stats.loss, stats.accuracy
            ),
        }
    }

    println!("\nModel artifact:  {}", report.model_path.display());
    println!("Bounds archive:  {}", report.bounds_path.display());

    Ok(())
}

fn cmd_predict(
    model: &Path,
    bounds: &Path,
    input: &Path,
    json: bool,
) -> Result<(), MoodcastCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(MoodcastCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let raw: Vec<f32> = serde_json::from_str(input_data.trim())?;
    if raw.len() != NUM_FEATURES {
        return Err(MoodcastCliError::BadFeatureVector(raw.len()));
    }

    let predictor = MoodPredictor::from_files(model, bounds)?;
    let prediction = predictor.predict(&raw)?;

    if json {
        let out = serde_json::json!({
            "mood": prediction.mood.as_str(),
            "confidence": prediction.confidence(),
            "probabilities": {
                "happy": prediction.probabilities[0],
                "neutral": prediction.probabilities[1],
                "sad": prediction.probabilities[2],
                "stressed": prediction.probabilities[3],
            }
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Predicted mood: {} ({:.1}% confidence)",
            prediction.mood.as_str(),
            prediction.confidence() * 100.0
        );
        for (mood, p) in ["happy", "neutral", "sad", "stressed"]
            .iter()
            .zip(&prediction.probabilities)
        {
            println!("  {:<9} {:.4}", mood, p);
        }
    }

    Ok(())
}

fn cmd_inspect(model: &Path, json: bool) -> Result<(), MoodcastCliError> {
    let artifact = ModelExporter::load_artifact(model)?;

    if json {
        let out = serde_json::json!({
            "format_version": artifact.format_version,
            "producer": artifact.producer,
            "trained_at": artifact.trained_at,
            "input_width": artifact.input_width,
            "classes": artifact.classes,
            "layers": artifact.layers.iter().map(|l| {
                serde_json::json!({
                    "units": l.units,
                    "activation": l.activation.as_str(),
                    "parameters": l.weights.len() * l.units + l.biases.len(),
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Model Artifact");
    println!("==============");
    println!("Format version: {}", artifact.format_version);
    println!(
        "Producer:       {} {} ({})",
        artifact.producer.name, artifact.producer.version, artifact.producer.instance_id
    );
    println!("Trained at:     {}", artifact.trained_at);
    println!("Input width:    {}", artifact.input_width);
    println!("Classes:        {}", artifact.classes.join(", "));

    println!("\nFeature order:");
    for (i, spec) in FEATURES.iter().enumerate() {
        println!(
            "  {:>2}  {:<20} clip [{}, {}]",
            i, spec.name, spec.clip_min, spec.clip_max
        );
    }

    println!("\nLayers:");
    let mut total_params = 0usize;
    for (i, layer) in artifact.layers.iter().enumerate() {
        let params = layer.weights.len() * layer.units + layer.biases.len();
        total_params += params;
        println!(
            "  {}: dense({}, {})  {} parameters",
            i,
            layer.units,
            layer.activation.as_str(),
            params
        );
    }
    println!("Total parameters: {total_params}");

    Ok(())
}

// Error types

#[derive(Debug)]
enum MoodcastCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    NoInput,
    BadFeatureVector(usize),
}

impl From<io::Error> for MoodcastCliError {
    fn from(e: io::Error) -> Self {
        MoodcastCliError::Io(e)
    }
}

impl From<PipelineError> for MoodcastCliError {
    fn from(e: PipelineError) -> Self {
        MoodcastCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for MoodcastCliError {
    fn from(e: serde_json::Error) -> Self {
        MoodcastCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MoodcastCliError> for CliError {
    fn from(e: MoodcastCliError) -> Self {
        match e {
            MoodcastCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MoodcastCliError::Pipeline(e) => CliError {
                code: "PIPELINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'moodcast train --help' for valid options".to_string()),
            },
            MoodcastCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MoodcastCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No input provided on stdin".to_string(),
                hint: Some("Pipe a JSON array of 11 features or pass --input <file>".to_string()),
            },
            MoodcastCliError::BadFeatureVector(len) => CliError {
                code: "BAD_FEATURE_VECTOR".to_string(),
                message: format!("Expected {NUM_FEATURES} features, got {len}"),
                hint: Some(
                    "Feature order: heart_rate, sleep_asleep, sleep_deep, sleep_rem, \
                     sleep_light, sleep_awake, workout, steps, screen_time, \
                     social_interaction, outdoor_time"
                        .to_string(),
                ),
            },
        }
    }
}
