//! CLI handlers for `gmao plan` subcommands.
//!
//! Implements:
//! - `gmao plan import <file>`            -- import plans from a TOML file
//! - `gmao plan list`                     -- list all plans
//! - `gmao plan show <plan-id>`           -- plan details and its orders
//! - `gmao plan set-status <id> <status>` -- activate / deactivate / archive
//! - `gmao plan set-auto <id> <bool>`     -- toggle automatic generation
//! - `gmao plan pin <id> [technician-id]` -- pin or unpin a technician

use anyhow::{Context, Result};
use chrono::FixedOffset;
use sqlx::PgPool;

use gmao_core::import::{import_plans, parse_plan_file};
use gmao_db::models::PlanStatus;
use gmao_db::queries::{plans as plan_queries, users, work_orders};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    site_offset: FixedOffset,
) -> Result<()> {
    match command {
        PlanCommands::Import { file } => cmd_import(pool, &file, site_offset).await,
        PlanCommands::List => cmd_list(pool).await,
        PlanCommands::Show { plan_id } => cmd_show(pool, plan_id).await,
        PlanCommands::SetStatus { plan_id, status } => {
            let status: PlanStatus = status.parse()?;
            plan_queries::set_plan_status(pool, plan_id, status).await?;
            println!("Plan {plan_id} is now {status}.");
            Ok(())
        }
        PlanCommands::SetAuto { plan_id, enabled } => {
            plan_queries::set_auto_generate(pool, plan_id, enabled).await?;
            let state = if enabled { "on" } else { "off" };
            println!("Automatic generation {state} for plan {plan_id}.");
            Ok(())
        }
        PlanCommands::Pin {
            plan_id,
            technician_id,
        } => cmd_pin(pool, plan_id, technician_id).await,
    }
}

// -----------------------------------------------------------------------
// gmao plan import <file>
// -----------------------------------------------------------------------

async fn cmd_import(pool: &PgPool, file_path: &str, site_offset: FixedOffset) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read plan file: {file_path}"))?;

    let drafts = parse_plan_file(&content, site_offset)
        .with_context(|| format!("failed to parse plan file: {file_path}"))?;

    let created = import_plans(pool, &drafts).await?;

    println!("Imported {} plan(s):", created.len());
    for plan in &created {
        println!("  [{}] {}  {}", plan.id, plan.code, plan.name);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// gmao plan list
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let plans = plan_queries::list_plans(pool).await?;

    if plans.is_empty() {
        println!("No plans found. Use `gmao plan import <file>` to add some.");
        return Ok(());
    }

    let code_w = plans.iter().map(|p| p.code.len()).max().unwrap_or(4).max(4);
    let name_w = plans.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);

    println!(
        "{:>6}  {:<code_w$}  {:<name_w$}  {:<8}  {:<4}  {:<12}  NEXT DUE",
        "ID", "CODE", "NAME", "STATUS", "AUTO", "EVERY",
    );
    for plan in &plans {
        let every = match (plan.frequency_value, plan.frequency_unit) {
            (Some(v), Some(u)) => format!("{v} {u}"),
            _ => "-".to_string(),
        };
        let next_due = plan
            .next_due
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<code_w$}  {:<name_w$}  {:<8}  {:<4}  {:<12}  {}",
            plan.id,
            plan.code,
            plan.name,
            plan.status,
            if plan.auto_generate { "yes" } else { "no" },
            every,
            next_due,
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// gmao plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id: i64) -> Result<()> {
    let plan = plan_queries::get_plan(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;
    let counts = work_orders::get_order_counts(pool, plan_id).await?;
    let orders = work_orders::list_orders_for_plan(pool, plan_id).await?;

    println!("Plan: {} ({})", plan.name, plan.code);
    println!("  ID:           {}", plan.id);
    println!("  Status:       {}", plan.status);
    println!("  Auto:         {}", plan.auto_generate);
    match plan.asset_id {
        Some(id) => println!("  Asset:        {id}"),
        None => println!("  Asset:        (none)"),
    }
    if let (Some(v), Some(u)) = (plan.frequency_value, plan.frequency_unit) {
        println!("  Every:        {v} {u}");
    }
    if let Some(due) = plan.next_due {
        println!("  Next due:     {}", due.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(tech) = plan.technician_id {
        println!("  Technician:   {tech}");
    }
    println!(
        "  Orders:       {} total ({} pending, {} in progress, {} done, {} cancelled)",
        counts.total, counts.pending, counts.in_progress, counts.done, counts.cancelled
    );

    if !orders.is_empty() {
        println!();
        for order in &orders {
            println!(
                "  [{}] {}  created {}",
                order.status,
                order.order_number,
                order.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// gmao plan pin <plan-id> [technician-id]
// -----------------------------------------------------------------------

async fn cmd_pin(pool: &PgPool, plan_id: i64, technician_id: Option<i64>) -> Result<()> {
    if let Some(tech_id) = technician_id {
        let user = users::get_user(pool, tech_id)
            .await?
            .with_context(|| format!("user {tech_id} not found"))?;
        if !user.role.is_technician() {
            anyhow::bail!("user {tech_id} ({}) is not a technician", user.role);
        }
        if !user.active {
            tracing::warn!(technician_id = tech_id, "pinning an inactive technician");
        }
    }

    plan_queries::set_pinned_technician(pool, plan_id, technician_id).await?;
    match technician_id {
        Some(id) => println!("Plan {plan_id} pinned to technician {id}."),
        None => println!("Plan {plan_id} unpinned."),
    }
    Ok(())
}
