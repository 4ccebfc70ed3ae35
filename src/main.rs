//! # People Finder CLI (`pf`)
//!
//! Manage employee profiles, search them, and run the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! pf --config ./config/pf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pf serve` | Start the HTTP API |
//! | `pf search "<query>"` | Explained search over the profiles |
//! | `pf profile upsert --email <e> [...]` | Create or update a profile |
//! | `pf profile list [--indexed]` | Print the table (or the indexed documents) |
//! | `pf profile count` | Number of indexed documents |
//! | `pf reindex` | Rebuild the index from the table |
//! | `pf org` | Print the org chart as JSON |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use people_finder::config::{self, Config};
use people_finder::finder::PeopleFinder;
use people_finder::models::ProfileInput;
use people_finder::{orgchart, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// People Finder: find colleagues by describing what you need.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pf.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "pf", version, about = "People Finder: explained search over employee profiles")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Find people matching a free-text request.
    ///
    /// Retrieves the closest profiles from the index and asks the configured
    /// reasoning provider which of them fit and why.
    Search {
        /// What you are looking for, e.g. "someone who knows Terraform".
        query: String,

        /// Maximum number of matches (defaults to `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Manage profiles.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Rebuild the vector index from the profile table.
    Reindex,

    /// Print the org chart as JSON.
    Org,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a profile or update the one with the same email.
    ///
    /// Omitted or empty fields keep their stored value on update.
    Upsert {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        skills: Option<String>,
        #[arg(long)]
        experience: Option<String>,
    },

    /// Print the profile table as JSON.
    List {
        /// List what the vector index holds instead of the table.
        #[arg(long)]
        indexed: bool,
    },

    /// Print the number of indexed documents.
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, top_k } => {
            let finder = PeopleFinder::open(&cfg).await?;
            let outcome = finder
                .search(&query, top_k.unwrap_or(cfg.retrieval.top_k))
                .await?;
            if outcome.matches.is_empty() {
                println!("No matching people found.");
            } else {
                print!("{}", outcome.formatted);
            }
        }
        Commands::Profile { action } => run_profile(&cfg, action).await?,
        Commands::Reindex => {
            let finder = PeopleFinder::open(&cfg).await?;
            let count = finder.reindex().await?;
            println!("Indexed {} profiles.", count);
        }
        Commands::Org => {
            if !cfg.org_chart.path.exists() {
                bail!("org chart file not found: {}", cfg.org_chart.path.display());
            }
            let nodes = orgchart::load_org_chart(&cfg.org_chart.path)?;
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
    }

    Ok(())
}

async fn run_profile(cfg: &Config, action: ProfileAction) -> Result<()> {
    let finder = PeopleFinder::open(cfg).await?;

    match action {
        ProfileAction::Upsert {
            email,
            name,
            job_title,
            department,
            team,
            skills,
            experience,
        } => {
            let input = ProfileInput {
                name,
                email: Some(email),
                job_title,
                department,
                team,
                skills,
                experience,
            };
            let outcome = finder.upsert(&input).await?;
            println!("{}", outcome.message);
            if !outcome.index_synced {
                eprintln!("warning: profile saved but the search index is stale; run `pf reindex`");
            }
        }
        ProfileAction::List { indexed } => {
            let json = if indexed {
                serde_json::to_string_pretty(&finder.indexed().await?)?
            } else {
                serde_json::to_string_pretty(&finder.profiles().await)?
            };
            println!("{}", json);
        }
        ProfileAction::Count => {
            println!("{}", finder.count().await?);
        }
    }

    Ok(())
}
