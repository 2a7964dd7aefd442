use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rent_data::BracketLoader;
use rent_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load tax bracket tables from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - tax_year: The tax year (e.g., 2025)
/// - region: `CA` for the federal table, otherwise a province code (e.g., BC)
/// - level: `federal` or `provincial`
/// - min_income: Lower bound of the band
/// - max_income: Upper bound of the band (empty for unbounded)
/// - rate: The marginal tax rate as a decimal (e.g., 0.0506)
///
/// Every (tax_year, region, level) table in the file replaces the stored
/// table of the same key. Settings for each table must already exist.
#[derive(Parser, Debug)]
#[command(name = "rent-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing tax bracket data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "rent.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading tax brackets from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = BracketLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let inserted = BracketLoader::load(&repo, &records)
        .await
        .context("Failed to load tax brackets into database")?;

    println!(
        "Successfully loaded {} tax brackets into the database.",
        inserted
    );

    Ok(())
}
