//! Configuration file management for gmao.
//!
//! Provides a TOML-based config file at `~/.config/gmao/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use gmao_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Site calendar settings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Offset from UTC, in minutes, that defines the site's calendar day.
    ///
    /// The offset is fixed all year. Sites observing daylight saving time
    /// must pick one offset; during the other half of the year the
    /// calendar day turns over an hour away from local midnight.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the gmao config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/gmao` or `~/.config/gmao`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("gmao");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gmao")
}

/// Return the path to the gmao config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the URL may hold a password.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct GmaoConfig {
    pub db_config: DbConfig,
    pub bind: String,
    pub port: u16,
    /// Offset whose calendar day decides whether a plan is due.
    pub site_offset: FixedOffset,
}

impl GmaoConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `GMAO_DATABASE_URL` env > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Site offset: `GMAO_UTC_OFFSET_MINUTES` env > `schedule.utc_offset_minutes` > UTC
    /// - Bind address and port: config file > defaults (the `serve` flags override later)
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("GMAO_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let mut db_config = DbConfig::from_env();
        db_config.database_url = db_url;

        let offset_minutes = if let Ok(raw) = std::env::var("GMAO_UTC_OFFSET_MINUTES") {
            raw.trim()
                .parse::<i32>()
                .with_context(|| format!("GMAO_UTC_OFFSET_MINUTES is not an integer: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.schedule.utc_offset_minutes
        } else {
            0
        };
        let site_offset = offset_from_minutes(offset_minutes)?;

        let (bind, port) = match file_config {
            Some(cfg) => (cfg.server.bind, cfg.server.port),
            None => (default_bind(), default_port()),
        };

        Ok(Self {
            db_config,
            bind,
            port,
            site_offset,
        })
    }

    /// Current time in the site offset.
    pub fn site_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.site_offset)
    }

    /// Parse an RFC 3339 `--now` override, or fall back to the clock.
    pub fn now_or(&self, raw: Option<&str>) -> Result<DateTime<FixedOffset>> {
        match raw {
            Some(raw) => parse_now(raw, self.site_offset),
            None => Ok(self.site_now()),
        }
    }
}

/// Convert a minute offset into a [`FixedOffset`], rejecting out-of-range
/// values (beyond +/- 24h). No daylight-saving adjustment is applied.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("UTC offset out of range: {minutes} minutes"))
}

/// Parse a `now` override: RFC 3339 keeps its own offset, a bare
/// `YYYY-MM-DD` means noon on that day at `site_offset`.
pub fn parse_now(raw: &str, site_offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .and_then(|dt| dt.and_local_timezone(site_offset).single())
        .with_context(|| format!("invalid time {raw:?} (expected RFC 3339 or YYYY-MM-DD)"))
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
