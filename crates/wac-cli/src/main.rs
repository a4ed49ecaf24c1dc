use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wac_commands::{check_reply, set_reply, stats_reply};
use wac_ingest::import_roster;
use wac_storage::ContactStore;

const DB_ENV_VAR: &str = "WAC_DB";

#[derive(Parser)]
#[command(name = "wac")]
#[command(about = "WhatsApp contact roster CLI", long_about = None)]
struct Cli {
    /// Contacts database path; defaults to $WAC_DB, then the user data dir
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up whether a number is marked as having WhatsApp
    Check { phone: String },
    /// Create or update the record for a number
    Set {
        phone: String,
        flag: String,
        note: Vec<String>,
    },
    /// Show aggregate roster counts
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Bulk-import a roster CSV (header: phone,has_whatsapp,note)
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db);
    let mut store = ContactStore::open(&db_path)
        .with_context(|| format!("failed to open contacts database at {}", db_path.display()))?;
    info!(db = %db_path.display(), "contacts database ready");

    match cli.command {
        Commands::Check { phone } => {
            println!("{}", check_reply(&store, &phone)?);
        }
        Commands::Set { phone, flag, note } => {
            let note = note.join(" ");
            let note = note.trim();
            let note = (!note.is_empty()).then_some(note);
            println!("{}", set_reply(&store, &phone, &flag, note)?);
        }
        Commands::Stats { json } => {
            if json {
                let stats = store.stats()?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", stats_reply(&store)?);
            }
        }
        Commands::Import { file } => {
            let report = import_roster(&mut store, &file)
                .with_context(|| format!("failed to import roster from {}", file.display()))?;
            info!(rows = report.rows_read, "roster import finished");
            println!(
                "Imported {} rows: {} new, {} updated.",
                report.rows_read, report.inserted, report.updated
            );
        }
    }

    Ok(())
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var(DB_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("wac").join("contacts.db"))
        .unwrap_or_else(|| PathBuf::from("contacts.db"))
}
