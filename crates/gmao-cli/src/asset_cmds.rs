//! CLI handlers for `gmao asset` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use gmao_db::queries::assets;

use crate::AssetCommands;

pub async fn run_asset_command(command: AssetCommands, pool: &PgPool) -> Result<()> {
    match command {
        AssetCommands::Add {
            code,
            name,
            location,
        } => {
            let asset = assets::insert_asset(pool, &code, &name, location.as_deref()).await?;
            println!("Asset {} created with id {}.", asset.code, asset.id);
            Ok(())
        }
        AssetCommands::List => {
            let all = assets::list_assets(pool).await?;
            if all.is_empty() {
                println!("No assets found. Use `gmao asset add` to create one.");
                return Ok(());
            }
            let code_w = all.iter().map(|a| a.code.len()).max().unwrap_or(4).max(4);
            println!("{:>6}  {:<code_w$}  NAME (LOCATION)", "ID", "CODE");
            for asset in &all {
                let location = asset
                    .location
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default();
                println!("{:>6}  {:<code_w$}  {}{}", asset.id, asset.code, asset.name, location);
            }
            Ok(())
        }
    }
}
