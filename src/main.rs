//! # Carousel CLI
//!
//! Command-line interface for carousel export.
//!
//! ## Usage
//!
//! ```bash
//! # Export a deck file to ./carousel-export.zip
//! carousel export deck.json
//!
//! # Override the font and use a server fallback
//! carousel export deck.json --font terminal-grotesque \
//!     --fallback-url http://localhost:8080/api/carousel/export --out dist/
//!
//! # Run the archive server
//! carousel serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use carousel::{
    CarouselError, CarouselFont, ExportConfig, Exporter, SlideDeck,
    export,
    server::{self, ServerConfig},
};

/// Carousel - social carousel exporter
#[derive(Parser, Debug)]
#[command(name = "carousel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a deck file into carousel-export.zip
    Export {
        /// Deck JSON file ({ "font": ..., "slides": [...] })
        deck: PathBuf,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Override the deck's font (diatype, standard, terminal-grotesque)
        #[arg(long)]
        font: Option<CarouselFont>,

        /// JSON config file (ExportConfig fields, camelCase)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Server archive endpoint used when local ZIP assembly fails
        #[arg(long, value_name = "URL")]
        fallback_url: Option<String>,

        /// Directory containing <font>.ttf files
        #[arg(long, value_name = "DIR")]
        font_dir: Option<PathBuf>,

        /// Async PNG encode timeout in milliseconds
        #[arg(long)]
        encode_timeout_ms: Option<u64>,
    },

    /// Run the archive-building HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carousel=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CarouselError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            deck,
            out,
            font,
            config,
            fallback_url,
            font_dir,
            encode_timeout_ms,
        } => {
            let mut export_config = match config {
                Some(path) => ExportConfig::load(&path)?,
                None => ExportConfig::default(),
            };
            if fallback_url.is_some() {
                export_config.fallback_endpoint = fallback_url;
            }
            if font_dir.is_some() {
                export_config.font_dir = font_dir;
            }
            if let Some(ms) = encode_timeout_ms {
                export_config.encode_timeout_ms = ms;
            }

            let json = tokio::fs::read_to_string(&deck).await?;
            let mut slide_deck = SlideDeck::from_json(&json)?;
            if let Some(font) = font {
                slide_deck.font = font;
            }

            let exporter = Exporter::new(export_config)?;
            let outcome = exporter.export(&slide_deck).await?;
            let path = export::deliver(&outcome.archive, &out).await?;
            println!(
                "Saved {} slides ({} bytes) to {}",
                outcome.entries.len(),
                outcome.archive.len(),
                path.display()
            );
        }
        Commands::Serve { listen } => {
            server::serve(ServerConfig {
                listen_addr: listen,
            })
            .await?;
        }
    }

    Ok(())
}
