//! CLI handlers for `gmao order` subcommands.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use sqlx::PgPool;

use gmao_db::models::OrderStatus;
use gmao_db::queries::work_orders;

use crate::OrderCommands;

pub async fn run_order_command(command: OrderCommands, pool: &PgPool) -> Result<()> {
    match command {
        OrderCommands::List { plan } => cmd_list(pool, plan).await,
        OrderCommands::SetStatus { order_id, status } => {
            let status: OrderStatus = status.parse()?;
            cmd_set_status(pool, order_id, status).await
        }
    }
}

async fn cmd_list(pool: &PgPool, plan_id: Option<i64>) -> Result<()> {
    let orders = work_orders::list_work_orders(pool, plan_id).await?;
    if orders.is_empty() {
        println!("No work orders found.");
        return Ok(());
    }

    let num_w = orders
        .iter()
        .map(|o| o.order_number.len())
        .max()
        .unwrap_or(6)
        .max(6);
    println!(
        "{:>6}  {:<num_w$}  {:<11}  {:<10}  {:>6}  {:>10}  CREATED",
        "ID", "NUMBER", "STATUS", "TYPE", "ASSET", "TECHNICIAN",
    );
    for order in &orders {
        let tech = order
            .technician_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<num_w$}  {:<11}  {:<10}  {:>6}  {:>10}  {}",
            order.id,
            order.order_number,
            order.status,
            order.order_type,
            order.asset_id,
            tech,
            order.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

async fn cmd_set_status(pool: &PgPool, order_id: i64, to: OrderStatus) -> Result<()> {
    let order = work_orders::get_work_order(pool, order_id)
        .await?
        .with_context(|| format!("work order {order_id} not found"))?;

    if !order.status.can_transition_to(to) {
        bail!(
            "cannot move order {} from {} to {to}",
            order.order_number,
            order.status
        );
    }

    let completed_at = (to == OrderStatus::Done).then(Utc::now);
    let updated =
        work_orders::transition_order_status(pool, order_id, order.status, to, completed_at)
            .await?;
    if updated == 0 {
        bail!("work order {order_id} changed concurrently; re-run to retry");
    }

    println!("Order {} is now {to}.", order.order_number);
    Ok(())
}
