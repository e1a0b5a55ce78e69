#![cfg(not(tarpaulin_include))]

use std::io::Write;
use std::path::{Path, PathBuf};

use asoa::boat::{Boat, fuzzy_date};
use asoa::config::DEFAULT_DB_PATH;
use asoa::downloader::{export_filename, to_xlsx};
use asoa::loader::{last_modified, load_roster};
use clap::{Parser, Subcommand};
use tempfile::NamedTempFile;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Query the Seabreeze roster from the command line
#[derive(Parser)]
#[command(name = "roster", version)]
struct Cli {
    /// Roster workbook to read
    #[arg(long, env = "ASOA_DB_PATH", default_value = DEFAULT_DB_PATH, global = true)]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every known boat
    List,
    /// Search boat names, berths and owners
    Search { query: String },
    /// Show one boat and its owners
    Show { hull: String },
    /// Write the member export workbook
    Export {
        /// Output file; defaults to the dated export name
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("asoa=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let roster = load_roster(&cli.db_path)?;

    match cli.command {
        Command::List => {
            for boat in roster.iter() {
                print_row(boat);
            }
        }
        Command::Search { query } => {
            let hits = roster.search(&query);
            for boat in &hits {
                print_row(boat);
            }
            eprintln!("{} match(es)", hits.len());
        }
        Command::Show { hull } => match roster.get(hull.trim()) {
            Some(boat) => print_detail(boat),
            None => {
                eprintln!("Hull {} is not a known Seabreeze", hull);
                std::process::exit(1);
            }
        },
        Command::Export { out } => {
            let out = match out {
                Some(out) => out,
                None => PathBuf::from(export_filename(&last_modified(&cli.db_path)?)),
            };
            write_atomically(&out, &to_xlsx(&roster)?)?;
            info!(file = %out.display(), boats = roster.len(), "export written");
            println!("{}", out.display());
        }
    }

    Ok(())
}

fn print_row(boat: &Boat) {
    let owner = boat
        .current_owner()
        .map(|o| o.owner_name.as_str())
        .unwrap_or("");
    println!(
        "{:>5}  {:<24} {:<6} {:<28} {}",
        boat.hull, boat.boat_name, boat.status, owner, boat.berth
    );
}

fn print_detail(boat: &Boat) {
    println!("Hull:      {}", boat.hull);
    println!("Name:      {}", boat.boat_name);
    println!("Status:    {}", boat.status);
    println!("Sail #:    {}", boat.sailnum);
    println!("Rig:       {}", boat.rig);
    println!("Color:     {}", boat.color);
    println!("Engine:    {} {}", boat.engine_type, boat.engine_desc);
    println!("Berth:     {}", boat.berth);
    if !boat.latest_info.is_empty() {
        println!("Latest:    {}", boat.latest_info);
    }
    if !boat.epitaph.is_empty() {
        println!("Epitaph:   {}", boat.epitaph);
    }
    println!("Owners:");
    for owner in &boat.owners {
        let acquired = owner.acquired.as_ref().map(fuzzy_date).unwrap_or_default();
        println!("  {:<10} {}", acquired, owner.owner_name);
    }
}

// Written beside the destination, then renamed into place.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
