use clap::Parser;
use std::path::PathBuf;

use bloomsight::{FlowerPipeline, ImageResult, PipelineConfig};

#[derive(Parser)]
#[command(name = "bloomsight")]
#[command(about = "Detect flowers and classify pollination readiness")]
struct Cli {
    /// Path to the detection model (.rten)
    #[arg(long, value_name = "MODEL")]
    detector: PathBuf,

    /// Path to the readiness classification model (.rten)
    #[arg(long, value_name = "MODEL")]
    classifier: PathBuf,

    /// Process a single image
    #[arg(long, value_name = "IMAGE", conflicts_with = "batch")]
    image: Option<PathBuf>,

    /// Process every image in a directory
    #[arg(long, value_name = "DIR")]
    batch: Option<PathBuf>,

    /// Detection confidence threshold
    #[arg(long, default_value_t = 0.5)]
    conf: f32,

    /// Where to write batch statistics JSON
    #[arg(long, default_value = "results.json", value_name = "FILE")]
    output: PathBuf,

    /// Where to write the annotated image in single-image mode
    #[arg(long, default_value = "annotated_output.jpg", value_name = "FILE")]
    annotated_out: PathBuf,

    /// TTF/OTF font for annotation labels (boxes only without it)
    #[arg(long, value_name = "FONT")]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();

    let config = PipelineConfig {
        confidence_threshold: args.conf,
        font_path: args.font.clone(),
        ..Default::default()
    };
    let pipeline = FlowerPipeline::new(&args.detector, &args.classifier, config)?;

    if let Some(image) = &args.image {
        let result = pipeline.process_image(image)?;

        println!("Detected {} flowers", result.observations.len());
        for (i, obs) in result.observations.iter().enumerate() {
            println!(
                "  Flower {}: {} ({:.2})",
                i + 1,
                obs.classification.class_name,
                obs.classification.confidence
            );
        }

        result.annotated.save(&args.annotated_out)?;
        println!("Annotated image written to {}", args.annotated_out.display());
    } else if let Some(dir) = &args.batch {
        let outcome = pipeline.process_batch(dir)?;
        let (results, failures) = (outcome.results, outcome.failures);
        let images: Vec<ImageResult> = results.into_iter().map(|(_, r)| r).collect();
        let stats = pipeline.get_statistics(&images);

        println!("\nBatch Results:");
        println!("  Images processed: {}", images.len());
        if !failures.is_empty() {
            println!("  Images skipped: {}", failures.len());
        }
        println!("  Total flowers: {}", stats.total_flowers);
        println!("  Class distribution:");
        for (label, count) in &stats.class_distribution {
            println!("    {label}: {count}");
        }
        println!("  Receptivity rate: {:.1}%", stats.receptivity_rate);

        let json = serde_json::to_string_pretty(&stats)?;
        std::fs::write(&args.output, json)?;
        println!("Statistics written to {}", args.output.display());
    } else {
        anyhow::bail!("specify either --image or --batch");
    }

    Ok(())
}
