//! CLI handlers for the generation commands.
//!
//! Implements:
//! - `gmao due`                  -- classify every plan at a point in time
//! - `gmao generate`             -- run one generation pass against the database
//! - `gmao simulate <snapshot>`  -- run a pass against a JSON snapshot, no database

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use sqlx::PgPool;

use gmao_core::due::{self, DueStatus};
use gmao_core::generator::{self, GenerationReport};
use gmao_core::store::{PgStore, Snapshot};
use gmao_db::queries::plans as plan_queries;

// -----------------------------------------------------------------------
// gmao due
// -----------------------------------------------------------------------

pub async fn run_due(pool: &PgPool, now: &DateTime<FixedOffset>) -> Result<()> {
    let plans = plan_queries::list_plans(pool).await?;
    if plans.is_empty() {
        println!("No plans found.");
        return Ok(());
    }

    println!("Due check at {}", now.to_rfc3339());
    println!();
    let code_w = plans.iter().map(|p| p.code.len()).max().unwrap_or(4).max(4);
    println!("{:>6}  {:<code_w$}  {:<8}  DETAIL", "ID", "CODE", "STATUS");
    for plan in &plans {
        let status = due::evaluate(plan, now);
        let detail = match status {
            DueStatus::Due(s) | DueStatus::NotDue(s) => format!(
                "next due {} (every {})",
                s.next_due.with_timezone(&now.timezone()).format("%Y-%m-%d"),
                s.frequency
            ),
            DueStatus::Invalid(err) => err.to_string(),
            DueStatus::Inactive => format!("status {}", plan.status),
            DueStatus::Manual => "automatic generation off".to_string(),
        };
        println!(
            "{:>6}  {:<code_w$}  {:<8}  {}",
            plan.id,
            plan.code,
            status.label(),
            detail
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// gmao generate
// -----------------------------------------------------------------------

pub async fn run_generate(pool: &PgPool, now: &DateTime<FixedOffset>, json: bool) -> Result<()> {
    let store = PgStore::new(pool.clone());
    let report = generator::generate_due_orders(&store, now).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, now);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// gmao simulate <snapshot.json>
// -----------------------------------------------------------------------

pub async fn run_simulate(
    file_path: &str,
    now: &DateTime<FixedOffset>,
    output: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read snapshot file: {file_path}"))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot file: {file_path}"))?;

    let (report, after) = generator::preview_due_orders(snapshot, now).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&after).context("failed to serialize snapshot")?;
        std::fs::write(out, json)
            .with_context(|| format!("failed to write snapshot to {out}"))?;
        eprintln!("Resulting snapshot written to {out}");
    }
    Ok(())
}

fn print_report(report: &GenerationReport, now: &DateTime<FixedOffset>) {
    print!("{}", format_report(report, now));
}

fn format_report(report: &GenerationReport, now: &DateTime<FixedOffset>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generation at {} ({} plans examined)",
        now.to_rfc3339(),
        report.plans_seen()
    );
    let _ = writeln!(out, "  Generated:            {}", report.generated);
    let _ = writeln!(out, "  Unassigned:           {}", report.unassigned);
    let _ = writeln!(out, "  Skipped (not due):    {}", report.skipped_not_due);
    let _ = writeln!(out, "  Skipped (duplicate):  {}", report.skipped_duplicate);
    let _ = writeln!(out, "  Skipped (inactive):   {}", report.skipped_inactive_or_manual);
    let _ = writeln!(out, "  Failed:               {}", report.failed);

    if !report.orders.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Orders:");
        for order in &report.orders {
            let tech = order
                .technician_id
                .map(|id| format!("technician {id}"))
                .unwrap_or_else(|| "unassigned".to_string());
            let _ = writeln!(
                out,
                "  [{}] {}  {}  next due {}",
                order.id,
                order.order_number,
                tech,
                order.next_due.with_timezone(&now.timezone()).format("%Y-%m-%d")
            );
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failures:");
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  plan {} ({}): {}",
                failure.plan_id, failure.plan_code, failure.message
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use gmao_core::generator::{FailureKind, GeneratedOrder, PlanFailure};

    use super::*;

    #[test]
    fn text_report_counts_every_examined_plan() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let now = offset.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let report = GenerationReport {
            generated: 1,
            unassigned: 1,
            skipped_not_due: 2,
            skipped_inactive_or_manual: 1,
            failed: 1,
            created_order_ids: vec![5],
            orders: vec![GeneratedOrder {
                id: 5,
                order_number: "WO-P001-20251001".to_string(),
                plan_id: Some(1),
                asset_id: 10,
                technician_id: None,
                scheduled_for: NaiveDate::from_ymd_opt(2025, 10, 1),
                next_due: NaiveDate::from_ymd_opt(2025, 10, 31)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
            }],
            failures: vec![PlanFailure {
                plan_id: 4,
                plan_code: "P004".to_string(),
                kind: FailureKind::Validation,
                message: "plan has no frequency".to_string(),
            }],
            ..GenerationReport::default()
        };

        let text = format_report(&report, &now);
        assert!(text.starts_with("Generation at 2025-10-01T12:00:00+00:00 (5 plans examined)"));
        assert!(text.contains("[5] WO-P001-20251001  unassigned  next due 2025-10-31"));
        assert!(text.contains("plan 4 (P004): plan has no frequency"));
    }
}
