//! Canteen CLI - sales reports from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Store a session issued by the backend
//! canteen login --token "$TOKEN" --role building_manager --user-id 7 --name "Asha" --building-id 3
//!
//! # List outlets in a building
//! canteen stalls building 3
//!
//! # This week's orders for building 3, filtered to one company, as xlsx
//! canteen report building 3 --range week --company cashe --export
//!
//! # A custom range for one outlet, rendered as HTML
//! canteen report stall 12 --range custom --start 2025-01-01 --end 2025-01-31 --html jan.html
//!
//! # Today's receipts for one outlet, checked against the backend's GST
//! canteen report stall 12 --range today --receipts
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `stalls` - List outlets
//! - `report` - Build a sales report

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canteen_core::{AdminId, BuildingId, StallId, UserId};
use canteen_reports::{ReportScope, ReportsConfig, StallRef};

mod commands;

use commands::CommandError;
use commands::report::{ReportFilters, ReportOutput};
use commands::session::LoginArgs;

#[derive(Parser)]
#[command(name = "canteen")]
#[command(author, version, about = "Canteen sales report tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a login session
    Login(LoginCommand),
    /// Forget the stored session
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// List outlets
    Stalls {
        #[command(subcommand)]
        target: StallsTarget,
    },
    /// Build a sales report
    Report {
        #[command(subcommand)]
        scope: ScopeCommand,
    },
}

#[derive(Args)]
struct LoginCommand {
    /// Bearer token issued by the backend
    #[arg(long)]
    token: String,

    /// Role (`admin`, `building_manager`, `hr`, `operational_manager`, `vendor`)
    #[arg(long)]
    role: String,

    #[arg(long)]
    user_id: i64,

    /// Display name
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: Option<String>,

    /// Building managed by this user
    #[arg(long)]
    building_id: Option<i64>,

    /// Vendor admin account owning outlets
    #[arg(long)]
    admin_id: Option<i64>,
}

#[derive(Subcommand)]
enum StallsTarget {
    /// Outlets in a building
    Building { id: i64 },
    /// Outlets of a vendor admin account
    Admin { id: i64 },
}

#[derive(Subcommand)]
enum ScopeCommand {
    /// One outlet
    Stall {
        id: i64,
        /// Outlet name for the report (defaults to the name on each order)
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Several outlets
    Stalls {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Every outlet in a building
    Building {
        id: i64,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Every outlet of a vendor admin account
    Admin {
        id: i64,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Orders placed by purchasers
    Users {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Date filter (`all`, `today`, `week`, `month`, `custom`)
    #[arg(long, default_value = "all")]
    range: String,

    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last day of a custom range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Purchaser company key (`all`, `unknown`, or e.g. `cashe`)
    #[arg(long, default_value = "all")]
    company: String,

    /// Row order (`date` or `outlet`)
    #[arg(long, default_value = "date")]
    sort: String,

    /// Write the workbook to this path
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Write the workbook to the export directory under a generated name
    #[arg(long, conflicts_with = "xlsx")]
    export: bool,

    /// Include GST and round-off columns in the workbook
    #[arg(long)]
    gst: bool,

    /// Write an HTML table to this path
    #[arg(long)]
    html: Option<PathBuf>,

    /// Log a GST receipt per order and flag totals that disagree with the backend
    #[arg(long)]
    receipts: bool,
}

impl ScopeCommand {
    fn into_parts(self) -> (ReportScope, FilterArgs) {
        match self {
            Self::Stall { id, name, filters } => {
                let stall = StallRef {
                    id: StallId::new(id),
                    name,
                };
                (ReportScope::Stall(stall), filters)
            }
            Self::Stalls { ids, filters } => (
                ReportScope::Stalls(ids.into_iter().map(|id| StallRef::new(StallId::new(id))).collect()),
                filters,
            ),
            Self::Building { id, filters } => (ReportScope::Building(BuildingId::new(id)), filters),
            Self::Admin { id, filters } => (ReportScope::AdminStalls(AdminId::new(id)), filters),
            Self::Users { ids, filters } => (
                ReportScope::Users(ids.into_iter().map(UserId::new).collect()),
                filters,
            ),
        }
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "canteen=info,canteen_reports=info".into());

    let json = std::env::var("CANTEEN_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = ReportsConfig::from_env()?;

    match cli.command {
        Commands::Login(login) => commands::session::login(
            &config,
            LoginArgs {
                token: login.token,
                role: login.role,
                user_id: login.user_id,
                name: login.name,
                email: login.email,
                building_id: login.building_id,
                admin_id: login.admin_id,
            },
        )?,
        Commands::Logout => commands::session::logout(&config)?,
        Commands::Whoami => commands::session::whoami(&config)?,
        Commands::Stalls { target } => match target {
            StallsTarget::Building { id } => {
                commands::stalls::list(&config, ReportScope::Building(BuildingId::new(id))).await?;
            }
            StallsTarget::Admin { id } => {
                commands::stalls::list(&config, ReportScope::AdminStalls(AdminId::new(id))).await?;
            }
        },
        Commands::Report { scope } => {
            let (scope, args) = scope.into_parts();
            let filters = ReportFilters {
                range: args.range,
                start: args.start,
                end: args.end,
                company: args.company,
                sort: args.sort,
            };
            let output = ReportOutput {
                xlsx: args.xlsx,
                export: args.export,
                include_gst: args.gst,
                html: args.html,
                receipts: args.receipts,
            };
            commands::report::run(&config, scope, filters, output).await?;
        }
    }
    Ok(())
}
