mod asset_cmds;
mod config;
mod maintenance_cmds;
mod order_cmds;
mod plan_cmds;
mod serve_cmd;
mod technician_cmds;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use gmao_db::pool;

use config::GmaoConfig;

#[derive(Parser)]
#[command(name = "gmao", about = "Preventive-maintenance work order generator")]
struct Cli {
    /// Database URL (overrides GMAO_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a gmao config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/gmao")]
        db_url: String,
        /// Site offset from UTC in minutes (decides the calendar day; fixed, no DST)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        utc_offset_minutes: i32,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the gmao database (requires config file or env vars)
    DbInit,
    /// Asset management
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Technician directory
    Technician {
        #[command(subcommand)]
        command: TechnicianCommands,
    },
    /// Maintenance plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Work order management
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Show which plans are due
    Due {
        /// Evaluate at this time (RFC 3339 or YYYY-MM-DD) instead of now
        #[arg(long)]
        now: Option<String>,
    },
    /// Generate work orders for every due plan
    Generate {
        /// Evaluate at this time (RFC 3339 or YYYY-MM-DD) instead of now
        #[arg(long)]
        now: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dry-run generation against a JSON snapshot (no database)
    Simulate {
        /// Snapshot file with `plans`, `orders` and `technicians`
        file: String,
        /// Evaluate at this time (RFC 3339 or YYYY-MM-DD) instead of now
        #[arg(long)]
        now: Option<String>,
        /// Write the resulting snapshot to this file
        #[arg(long)]
        output: Option<String>,
    },
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Register an asset
    Add {
        /// Unique asset code (e.g. CMP-01)
        code: String,
        /// Human-readable name
        name: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// List all assets
    List,
}

#[derive(Subcommand)]
pub enum TechnicianCommands {
    /// Add a technician
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        /// Register as lead technician
        #[arg(long)]
        lead: bool,
        /// Create the technician inactive
        #[arg(long)]
        inactive: bool,
    },
    /// List technicians
    List,
    /// Make a technician available for assignment
    Activate { id: i64 },
    /// Stop assigning new orders to a technician
    Deactivate { id: i64 },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Import plans from a TOML file
    Import {
        /// Path to the plan TOML file
        file: String,
    },
    /// List all plans
    List,
    /// Show plan details and its orders
    Show { plan_id: i64 },
    /// Change a plan's status (active, inactive, archived)
    SetStatus { plan_id: i64, status: String },
    /// Turn automatic generation on or off
    SetAuto {
        plan_id: i64,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Pin a technician to a plan (omit the technician to unpin)
    Pin {
        plan_id: i64,
        technician_id: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// List work orders, newest first
    List {
        /// Only orders generated from this plan
        #[arg(long)]
        plan: Option<i64>,
    },
    /// Move an order to a new status (pending, in_progress, done, cancelled)
    SetStatus { order_id: i64, status: String },
}

/// Execute the `gmao init` command: write config file.
fn cmd_init(db_url: &str, utc_offset_minutes: i32, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    config::offset_from_minutes(utc_offset_minutes)?;

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
        schedule: config::ScheduleSection { utc_offset_minutes },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  schedule.utc_offset_minutes = {utc_offset_minutes}");
    println!("    (fixed offset: daylight saving time is not followed)");
    println!();
    println!("Next: run `gmao db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `gmao db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &GmaoConfig) -> anyhow::Result<()> {
    println!("Initializing gmao database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("gmao db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that need neither a config nor a database.
    match cli.command {
        Commands::Init {
            db_url,
            utc_offset_minutes,
            force,
        } => return cmd_init(&db_url, utc_offset_minutes, force),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gmao", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let resolved = GmaoConfig::resolve(cli.database_url.as_deref())?;

    if let Commands::Simulate { file, now, output } = &cli.command {
        let now = resolved.now_or(now.as_deref())?;
        return maintenance_cmds::run_simulate(file, &now, output.as_deref()).await;
    }
    if let Commands::DbInit = cli.command {
        return cmd_db_init(&resolved).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = run_db_command(cli.command, &resolved, &db_pool).await;
    db_pool.close().await;
    result
}

/// Commands that run against the database.
async fn run_db_command(
    command: Commands,
    resolved: &GmaoConfig,
    db_pool: &sqlx::PgPool,
) -> anyhow::Result<()> {
    match command {
        Commands::Asset { command } => asset_cmds::run_asset_command(command, db_pool).await,
        Commands::Technician { command } => {
            technician_cmds::run_technician_command(command, db_pool).await
        }
        Commands::Plan { command } => {
            plan_cmds::run_plan_command(command, db_pool, resolved.site_offset).await
        }
        Commands::Order { command } => order_cmds::run_order_command(command, db_pool).await,
        Commands::Due { now } => {
            let now = resolved.now_or(now.as_deref())?;
            maintenance_cmds::run_due(db_pool, &now).await
        }
        Commands::Generate { now, json } => {
            let now = resolved.now_or(now.as_deref())?;
            maintenance_cmds::run_generate(db_pool, &now, json).await
        }
        Commands::Serve { bind, port } => {
            let bind = bind.unwrap_or_else(|| resolved.bind.clone());
            let port = port.unwrap_or(resolved.port);
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                site_offset: resolved.site_offset,
            };
            serve_cmd::run_serve(state, &bind, port).await
        }
        Commands::Init { .. }
        | Commands::Completions { .. }
        | Commands::DbInit
        | Commands::Simulate { .. } => anyhow::bail!("command does not use the database"),
    }
}
