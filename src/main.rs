use clap::{Parser, Subcommand};
use pixel_forge::config::{self, AppConfig};
use pixel_forge::pipeline::Pipeline;
use pixel_forge::record::{JsonRecordStore, RecordStore};
use pixel_forge::remote::RemoteMirror;
use pixel_forge::{batch, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pixel-forge")]
#[command(about = "Apply pixel filters to images and mirror the results to an object store")]
#[command(long_about = "\
Apply pixel filters to images and mirror the results to an object store

Each input is decoded, filtered, re-encoded as JPEG and stored next to its
original under the media root. A JSON record per image keeps the metadata.
With a bucket configured, results are also mirrored to the object store.

Filters: grayscale (gray), sepia, poster, blur, edge, solarize (solar)

Storage layout:

  media/
  ├── uploads/original/{id}_{filename}
  └── uploads/processed/processed_{id}_{filter}.jpg
  records/{id}.json

  bucket: processed_images/{id}_{filter}.jpg

Logging is controlled by RUST_LOG (default: info).

Run 'pixel-forge gen-config' to generate a documented pixel-forge.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter image files (or every image under a directory)
    Process {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Filter to apply
        #[arg(long, short)]
        filter: String,
    },
    /// List available filters
    Filters,
    /// Show a stored record
    Show {
        id: Uuid,
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// Object count and total size of the remote bucket
    Stats,
    /// Delete an object from the remote bucket
    RemoteDelete { key: String },
    /// Print a stock pixel-forge.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Filters => output::print_filters(),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        Command::Process { paths, filter } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let pipeline = Pipeline::from_config(&config)?;
            let files = batch::collect_uploads(&paths)?;
            let results = batch::process_files(&pipeline, &files, &filter);
            output::print_outcomes(&results, &filter);
            batch::check_outcomes(&results)?;
        }
        Command::Show { id, json } => {
            let config = config::load_config(&cli.config)?;
            let records = JsonRecordStore::new(&config.storage.records_dir);
            let record = records
                .get(id)?
                .ok_or_else(|| format!("No record with id {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                output::print_record(&record);
            }
        }
        Command::Stats => {
            let config = config::load_config(&cli.config)?;
            let mirror = remote_mirror(&config)?;
            output::print_stats(&config.remote.bucket, mirror.stats().as_ref());
        }
        Command::RemoteDelete { key } => {
            let config = config::load_config(&cli.config)?;
            let mirror = remote_mirror(&config)?;
            if mirror.delete(&key) {
                println!("Deleted {key}");
            } else {
                return Err(format!("Could not delete {key}").into());
            }
        }
    }

    Ok(())
}

fn remote_mirror(config: &AppConfig) -> Result<RemoteMirror, Box<dyn std::error::Error>> {
    if !config.remote.is_configured() {
        return Err("remote bucket is not configured (see [remote] in pixel-forge.toml)".into());
    }
    Ok(RemoteMirror::from_config(&config.remote)?)
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
