//! Database query functions for the `users` table (technician directory).

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{User, UserRole};

/// Insert a new user.
pub async fn insert_user(
    pool: &PgPool,
    name: &str,
    email: Option<&str>,
    role: UserRole,
    active: bool,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, role, active) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(active)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert user {name:?}"))?;

    Ok(user)
}

/// Fetch a user by id.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// List every user holding a technician role, active or not, by id.
pub async fn list_technicians(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users \
         WHERE role IN ('technician', 'lead_technician') \
         ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list technicians")?;

    Ok(users)
}

/// Toggle a user's active flag.
pub async fn set_user_active(pool: &PgPool, id: i64, active: bool) -> Result<User> {
    let user = sqlx::query_as::<_, User>("UPDATE users SET active = $1 WHERE id = $2 RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update user active flag")?;

    user.with_context(|| format!("user {id} not found"))
}
