//! Database query functions for the `assets` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::Asset;

/// Insert a new asset. Returns the row with its server-generated id.
pub async fn insert_asset(
    pool: &PgPool,
    code: &str,
    name: &str,
    location: Option<&str>,
) -> Result<Asset> {
    let asset = sqlx::query_as::<_, Asset>(
        "INSERT INTO assets (code, name, location) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(code)
    .bind(name)
    .bind(location)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert asset {code:?}"))?;

    Ok(asset)
}

/// Fetch an asset by id.
pub async fn get_asset(pool: &PgPool, id: i64) -> Result<Option<Asset>> {
    let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch asset")?;

    Ok(asset)
}

/// Fetch an asset by its unique code.
pub async fn get_asset_by_code(pool: &PgPool, code: &str) -> Result<Option<Asset>> {
    let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("failed to fetch asset by code")?;

    Ok(asset)
}

/// List all assets ordered by code.
pub async fn list_assets(pool: &PgPool) -> Result<Vec<Asset>> {
    let assets = sqlx::query_as::<_, Asset>("SELECT * FROM assets ORDER BY code")
        .fetch_all(pool)
        .await
        .context("failed to list assets")?;

    Ok(assets)
}
