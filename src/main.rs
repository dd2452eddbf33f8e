//! stream-scout CLI - find ranked torrent streams for movies and episodes.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stream_scout::planner::plan;
use stream_scout::{ContentType, ScoutConfig, StreamScout};

/// stream-scout - Scrape, match and rank torrent streams
#[derive(Parser)]
#[command(name = "stream-scout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", global = true, hide_env_values = true)]
    tmdb_key: Option<String>,

    /// Premiumize API key
    #[arg(long, env = "PREMIUMIZE_API_KEY", global = true, hide_env_values = true)]
    premiumize_key: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the listing site for a free-text query
    Search(SearchArgs),

    /// Resolve a movie or episode id into ranked streams
    Streams(StreamsArgs),

    /// Show the search strategies planned for a query
    Plan(PlanArgs),
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Content type: movie or series
    #[arg(short = 't', long = "type", default_value = "movie")]
    content_type: ContentType,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
struct StreamsArgs {
    /// Content type: movie or series
    content_type: ContentType,

    /// IMDb id; series use <imdb>:<season>:<episode>
    id: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
struct PlanArgs {
    /// Search query
    query: String,

    /// Content type: movie or series
    #[arg(short = 't', long = "type", default_value = "movie")]
    content_type: ContentType,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => ScoutConfig::from_file(path)?,
        None => ScoutConfig::default(),
    };
    if let Some(key) = cli.tmdb_key {
        config = config.with_tmdb_key(key);
    }
    if let Some(key) = cli.premiumize_key {
        config = config.with_premiumize_key(key);
    }

    match cli.command {
        Commands::Search(args) => run_search(&config, args).await,
        Commands::Streams(args) => run_streams(&config, args).await,
        Commands::Plan(args) => show_plan(args),
    }
}

async fn run_search(config: &ScoutConfig, args: SearchArgs) -> Result<()> {
    let scout = StreamScout::from_config(config);
    let response = scout.search(&args.query, args.content_type).await?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" ({} of {} results):\n",
                response.query,
                response.results.len(),
                response.total_results
            );

            for (i, hit) in response.results.iter().enumerate() {
                println!("{}. {}", i + 1, hit.title);
                println!(
                    "   Quality: {} | Size: {} | Seeders: {} | Leechers: {}",
                    if hit.quality.is_empty() { "-" } else { hit.quality.as_str() },
                    hit.size,
                    hit.seeders,
                    hit.leechers
                );
                println!("   Hash: {}", hit.info_hash);
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

async fn run_streams(config: &ScoutConfig, args: StreamsArgs) -> Result<()> {
    let scout = StreamScout::from_config(config);
    let response = scout.streams(args.content_type, &args.id).await;

    let stats = scout.cache().stats().await;
    debug!(
        "Response cache: {}/{} entries, ttl {}s",
        stats.entries, stats.max_entries, stats.ttl_secs
    );

    match args.format {
        OutputFormat::Text => {
            if let Some(failure) = response.failure() {
                eprintln!("Request failed at {}: {}", failure.step, failure.error);
            }
            println!("\n{} streams for {} {}:\n", response.streams.len(), args.content_type, args.id);

            for (i, stream) in response.streams.iter().enumerate() {
                println!("{}. {}", i + 1, stream.display_name);
                for line in stream.display_title.lines() {
                    println!("   {}", line);
                }
                println!("   URL: {}", stream.url);
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn show_plan(args: PlanArgs) -> Result<()> {
    let strategies = plan(&args.query, args.content_type);
    if strategies.is_empty() {
        anyhow::bail!("No usable query in \"{}\"", args.query);
    }

    for (i, strategy) in strategies.iter().enumerate() {
        println!("{}. {:<28} {}", i + 1, strategy.label, strategy.query);
    }
    Ok(())
}
