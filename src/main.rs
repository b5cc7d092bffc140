// ABOUTME: Main entry point for the deck-forge program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use deck_forge::{
    service, utils, Config, DeckError, DeckService, ExportRequest, GenerateRequest, ImageRequest,
};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a slide deck (JSON) for a topic
    Generate(GenerateArgs),

    /// Export a deck JSON file to PPTX
    Export(ExportArgs),

    /// Generate a single image and print it as a data URL
    Image(ImageArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Topic of the presentation
    #[arg(short, long)]
    topic: String,

    /// Number of slides (clamped to 4..=10)
    #[arg(short, long)]
    slides: Option<i64>,

    /// Output language
    #[arg(short, long)]
    lang: Option<String>,

    /// Text model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Path to output JSON file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the deck JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to output PPTX file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generate illustrations for the first MAX_IMAGE_SLIDES slides
    #[arg(long)]
    augment_images: bool,

    /// Deck style: 'professional' or 'casual'
    #[arg(long)]
    style: Option<String>,
}

#[derive(Args)]
struct ImageArgs {
    /// Image prompt
    #[arg(short, long)]
    prompt: String,

    /// Image model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Path to output JSON file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

async fn run(command: Commands, service: &DeckService) -> Result<(), DeckError> {
    match command {
        Commands::Generate(args) => {
            let request = GenerateRequest {
                topic: Some(args.topic),
                slide_count: args.slides,
                language: args.lang,
                model: args.model,
            };
            let deck = service.generate(&request).await?;
            utils::write_json_output(&deck, args.output.as_deref())
        }
        Commands::Export(args) => {
            utils::validate_file_exists(&args.input)?;
            let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
            let request = ExportRequest {
                deck: service::parse_deck(&raw)?,
                augment_images: args.augment_images,
                style: args.style,
            };
            let file = service.export(&request).await?;
            let output = args.output.unwrap_or_else(|| PathBuf::from(&file.filename));
            utils::ensure_parent_directory_exists(&output)?;
            fs::write(&output, &file.bytes)
                .map_err(|e| anyhow::anyhow!("Failed to write output file: {}", e))?;
            info!("Wrote {} ({})", output.display(), file.content_type);
            println!("PPTX generated successfully: {:?}", output);
            Ok(())
        }
        Commands::Image(args) => {
            let request = ImageRequest {
                prompt: Some(args.prompt),
                model: args.model,
            };
            let image = service.generate_image(&request).await?;
            utils::write_json_output(&image, args.output.as_deref())
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Use --help for usage information.");
        return;
    };

    let result = match DeckService::new(Config::from_env()) {
        Ok(service) => run(command, &service).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        let body = serde_json::to_string(&e.to_body()).unwrap_or_else(|_| e.to_string());
        eprintln!("Error ({}): {}", e.status_code(), body);
        std::process::exit(1);
    }
}
