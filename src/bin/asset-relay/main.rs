//! asset-relay CLI
//!
//! ## Commands
//!
//! - `serve`: Run the HTTP service on an in-memory store until Ctrl-C
//! - `decode <file>`: Decode one envelope and print its canonical encoding
//! - `kinds`: List the registered asset, relation and property kinds

use asset_relay::{
    codec::{
        encode, Codec, DecodeMode, Edge, EdgeTag, Entity, EntityTag, Envelope, Intent,
        TypeRegistry,
    },
    config::RelayConfig,
    server,
    store::MemoryStore,
    RelayError,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::sync::Notify;

#[derive(Parser)]
#[command(name = "asset-relay")]
#[command(author, version, about = "Asset graph API with a live change event stream", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and the /events change stream
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides the configuration file
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Decode a JSON envelope and print its canonical form
    Decode {
        /// Path to the JSON document
        path: PathBuf,

        /// Envelope kind of the document
        #[arg(short, long, value_enum, default_value = "entity")]
        envelope: EnvelopeArg,

        /// Decode permissively, as the emit endpoints do
        #[arg(long)]
        emit: bool,
    },

    /// List registered discriminators
    Kinds,
}

#[derive(Clone, Copy, ValueEnum)]
enum EnvelopeArg {
    Entity,
    Edge,
    EntityTag,
    EdgeTag,
}

fn decode_as<E: Envelope>(
    codec: &Codec,
    bytes: &[u8],
    mode: DecodeMode,
) -> Result<String, RelayError> {
    match codec.decode::<E>(bytes, mode)? {
        Intent::Upsert(record) => encode(&record),
        Intent::Delete(id) => Ok(format!("delete {} {}", E::RECORD, id)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut relay_config = match config {
                Some(path) => RelayConfig::load(path)?,
                None => RelayConfig::default(),
            };
            if let Some(bind) = bind {
                relay_config.bind = bind;
            }

            let shutdown = Arc::new(Notify::new());
            let on_ctrlc = shutdown.clone();
            ctrlc::set_handler(move || {
                println!("\nShutting down...");
                on_ctrlc.notify_one();
            })?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(async move {
                let store = Arc::new(MemoryStore::new());
                server::serve(&relay_config, store, async move {
                    shutdown.notified().await;
                })
                .await
            })?;
        }

        Commands::Decode {
            path,
            envelope,
            emit,
        } => {
            let bytes = std::fs::read(&path)?;
            let codec = Codec::new(Arc::new(TypeRegistry::standard()));
            let mode = if emit {
                DecodeMode::Permissive
            } else {
                DecodeMode::Strict
            };
            let output = match envelope {
                EnvelopeArg::Entity => decode_as::<Entity>(&codec, &bytes, mode),
                EnvelopeArg::Edge => decode_as::<Edge>(&codec, &bytes, mode),
                EnvelopeArg::EntityTag => decode_as::<EntityTag>(&codec, &bytes, mode),
                EnvelopeArg::EdgeTag => decode_as::<EdgeTag>(&codec, &bytes, mode),
            };
            match output {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Kinds => {
            let catalog = TypeRegistry::standard().catalog();
            println!("Asset kinds:");
            for kind in catalog.asset {
                println!("  {kind}");
            }
            println!("Relation kinds:");
            for kind in catalog.relation {
                println!("  {kind}");
            }
            println!("Property kinds:");
            for kind in catalog.property {
                println!("  {kind}");
            }
        }
    }

    Ok(())
}
