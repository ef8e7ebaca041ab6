//! CLI handlers for `gmao technician` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use gmao_db::models::UserRole;
use gmao_db::queries::users;

use crate::TechnicianCommands;

pub async fn run_technician_command(command: TechnicianCommands, pool: &PgPool) -> Result<()> {
    match command {
        TechnicianCommands::Add {
            name,
            email,
            lead,
            inactive,
        } => {
            let role = if lead {
                UserRole::LeadTechnician
            } else {
                UserRole::Technician
            };
            let user = users::insert_user(pool, &name, email.as_deref(), role, !inactive).await?;
            println!("Technician {} created with id {} ({}).", user.name, user.id, user.role);
            Ok(())
        }
        TechnicianCommands::List => {
            let all = users::list_technicians(pool).await?;
            if all.is_empty() {
                println!("No technicians found. Use `gmao technician add` to create one.");
                return Ok(());
            }
            let name_w = all.iter().map(|u| u.name.len()).max().unwrap_or(4).max(4);
            println!("{:>6}  {:<name_w$}  {:<15}  ACTIVE", "ID", "NAME", "ROLE");
            for user in &all {
                println!(
                    "{:>6}  {:<name_w$}  {:<15}  {}",
                    user.id,
                    user.name,
                    user.role,
                    if user.active { "yes" } else { "no" },
                );
            }
            Ok(())
        }
        TechnicianCommands::Activate { id } => set_active(pool, id, true).await,
        TechnicianCommands::Deactivate { id } => set_active(pool, id, false).await,
    }
}

async fn set_active(pool: &PgPool, id: i64, active: bool) -> Result<()> {
    let user = users::set_user_active(pool, id, active).await?;
    let state = if user.active { "active" } else { "inactive" };
    println!("Technician {} ({}) is now {state}.", user.id, user.name);
    Ok(())
}
