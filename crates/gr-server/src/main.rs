//! The gridrealm world server.

mod assets;
mod codec;
mod commands;
mod net;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gridrealm",
    about = "gridrealm: an authoritative tick server for a multiplayer grid world",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tick loop and accept client connections
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:43594")]
        listen: String,

        /// Map directory (map.json + layer CSVs); an open field when omitted
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Content JSON file; built-in content when omitted
        #[arg(short, long)]
        content: Option<PathBuf>,

        /// Directory holding character files
        #[arg(short, long, default_value = "characters")]
        data: PathBuf,

        /// Tick period in milliseconds
        #[arg(long, default_value = "600")]
        tick_ms: u64,

        /// Maximum concurrent players
        #[arg(long, default_value = "1000")]
        max_players: usize,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Run a headless simulation with scripted bot players
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Number of bot players
        #[arg(short, long, default_value = "3")]
        bots: usize,

        /// Map directory; an open field when omitted
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Content JSON file; built-in content when omitted
        #[arg(short, long)]
        content: Option<PathBuf>,
    },

    /// Load a map directory and report on it
    CheckMap {
        /// Map directory
        #[arg(short, long)]
        map: PathBuf,

        /// Content JSON file; built-in content when omitted
        #[arg(short, long)]
        content: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve {
            listen,
            map,
            content,
            data,
            tick_ms,
            max_players,
            seed,
        } => commands::serve::run(
            &listen,
            map.as_deref(),
            content.as_deref(),
            &data,
            tick_ms,
            max_players,
            seed,
        ),
        Commands::Simulate {
            ticks,
            seed,
            bots,
            map,
            content,
        } => commands::simulate::run(map.as_deref(), content.as_deref(), ticks, seed, bots),
        Commands::CheckMap { map, content } => commands::check_map::run(&map, content.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
