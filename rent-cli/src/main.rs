use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, info};

use rent_cli::config::{RawSettings, Settings};
use rent_cli::logging::{self, LogOptions};
use rent_cli::{app, utils};
use rent_core::{NewHouseholdMember, RentRepository, SharedTaxConfig};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Take-home pay and rent affordability calculator.
///
/// Computes federal and provincial income tax from stored bracket tables
/// and turns take-home pay into a recommended rent ceiling.
#[derive(Debug, Parser)]
#[command(name = "rent-budget", version)]
struct Cli {
    /// TOML settings file. Defaults to `rent-budget.toml` when present.
    #[arg(long, global = true, env = "RENT_BUDGET_CONFIG")]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true, env = "RENT_BUDGET_BACKEND")]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `rent.db`) or `:memory:`.
    #[arg(long, global = true, env = "RENT_BUDGET_DATABASE")]
    db: Option<String>,

    /// Log filter for stderr and the log file, e.g. `debug`.
    #[arg(long, global = true, env = "RENT_BUDGET_LOG")]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Suppress log output on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct JurisdictionArgs {
    /// Tax year of the bracket tables.
    #[arg(long, env = "RENT_BUDGET_TAX_YEAR")]
    year: Option<i32>,

    /// Province or territory code, e.g. `BC`.
    #[arg(long, env = "RENT_BUDGET_REGION")]
    region: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Federal and provincial tax and take-home pay for one salary.
    TakeHome {
        /// Annual gross salary, e.g. `75,000`.
        #[arg(long, value_parser = utils::parse_decimal)]
        salary: Decimal,

        #[command(flatten)]
        jurisdiction: JurisdictionArgs,
    },

    /// Recommended rent for already-known monthly take-home incomes.
    Afford {
        /// Monthly take-home of each earner; repeat for a shared rental.
        #[arg(long = "monthly", required = true, num_args = 1.., value_parser = utils::parse_decimal)]
        monthly: Vec<Decimal>,
    },

    /// Manage stored household members.
    #[command(subcommand)]
    Member(MemberCommand),

    /// Combined affordability and rent split for every stored member.
    Household {
        #[command(flatten)]
        jurisdiction: JurisdictionArgs,
    },
}

#[derive(Debug, Subcommand)]
enum MemberCommand {
    /// Store a new member.
    Add {
        #[arg(long)]
        name: String,

        /// Annual gross salary.
        #[arg(long, value_parser = utils::parse_decimal)]
        salary: Decimal,
    },
    /// List stored members.
    List,
    /// Delete a member by id.
    Remove {
        #[arg(long)]
        id: i64,
    },
}

impl Cli {
    fn settings_layer(&self) -> RawSettings {
        let jurisdiction = match &self.command {
            Command::TakeHome { jurisdiction, .. } | Command::Household { jurisdiction } => {
                Some(jurisdiction)
            }
            _ => None,
        };
        RawSettings {
            backend: self.backend.clone(),
            database: self.db.clone(),
            tax_year: jurisdiction.and_then(|j| j.year),
            region: jurisdiction.and_then(|j| j.region.clone()),
        }
    }
}

// ─── logging ─────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    logging::init(&LogOptions {
        level: cli.log_level.clone(),
        file: cli.log_file.clone(),
        quiet: cli.quiet,
    })
}

async fn open_repository(settings: &Settings) -> anyhow::Result<Box<dyn RentRepository>> {
    debug!("connecting to {} backend", settings.backend);
    app::build_registry()
        .create(&app::db_config(settings))
        .await
        .with_context(|| {
            format!(
                "cannot open {} database '{}'",
                settings.backend, settings.database
            )
        })
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let working_dir = std::env::current_dir().context("cannot determine working directory")?;
    let settings = Settings::resolve(cli.config.as_deref(), &working_dir, cli.settings_layer())?;
    debug!(?settings, "resolved settings");

    match cli.command {
        Command::Afford { monthly } => {
            println!("{}", app::afford_report(&monthly));
        }
        Command::TakeHome { salary, .. } => {
            let repo = open_repository(&settings).await?;
            let shared = SharedTaxConfig::default();
            app::activate_tax_config(&*repo, &shared, settings.tax_year, &settings.region).await?;
            println!("{}", app::take_home_report(&shared.current(), salary));
        }
        Command::Household { .. } => {
            let repo = open_repository(&settings).await?;
            let shared = SharedTaxConfig::default();
            app::activate_tax_config(&*repo, &shared, settings.tax_year, &settings.region).await?;
            let members = repo.list_members().await?;
            println!("{}", app::household_report(&shared.current(), &members));
        }
        Command::Member(MemberCommand::Add { name, salary }) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("member name must not be empty");
            }
            let repo = open_repository(&settings).await?;
            let member = repo
                .create_member(NewHouseholdMember {
                    name,
                    annual_salary: salary,
                })
                .await?;
            info!(id = member.id, "member added");
            println!("Added member {} ({})", member.id, member.name);
        }
        Command::Member(MemberCommand::List) => {
            let repo = open_repository(&settings).await?;
            let members = repo.list_members().await?;
            println!("{}", app::format_member_list(&members));
        }
        Command::Member(MemberCommand::Remove { id }) => {
            let repo = open_repository(&settings).await?;
            repo.delete_member(id)
                .await
                .with_context(|| format!("cannot remove member {id}"))?;
            println!("Removed member {id}");
        }
    }

    Ok(())
}
