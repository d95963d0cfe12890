use std::time::Duration;

use anyhow::{bail, Context};

/// Table identifiers spliced into statement templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub cards: String,
    pub images: String,
    pub banlist_tcg: String,
    pub banlist_ocg: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cards: "cards".to_string(),
            images: "card_images".to_string(),
            banlist_tcg: "banlist_tcg".to_string(),
            banlist_ocg: "banlist_ocg".to_string(),
        }
    }
}

impl TableNames {
    fn validate(&self) -> anyhow::Result<()> {
        for (var, name) in [
            ("CARD_TABLE_NAME", &self.cards),
            ("IMAGES_TABLE_NAME", &self.images),
            ("BANLIST_TCG_TABLE_NAME", &self.banlist_tcg),
            ("BANLIST_OCG_TABLE_NAME", &self.banlist_ocg),
        ] {
            if !is_identifier(name) {
                bail!("{} is not a valid table identifier: {:?}", var, name);
            }
        }
        Ok(())
    }
}

/// Connection pool sizing for [`crate::database::create_pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 16,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl PoolSettings {
    fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if self.min_connections > self.max_connections {
            bail!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.min_connections,
                self.max_connections
            );
        }
        Ok(())
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub tables: TableNames,
    pub pool: PoolSettings,
    /// File path or http(s) URL for `/cards/load`.
    pub card_source: String,
    pub skip_migrations: bool,
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load from the environment (after `.env` has been applied).
    ///
    /// | Env Var                  | Default         |
    /// |--------------------------|-----------------|
    /// | `DATABASE_URL`           | required        |
    /// | `HOST`                   | `127.0.0.1`     |
    /// | `PORT`                   | `4000`          |
    /// | `CARD_TABLE_NAME`        | `cards`         |
    /// | `IMAGES_TABLE_NAME`      | `card_images`   |
    /// | `BANLIST_TCG_TABLE_NAME` | `banlist_tcg`   |
    /// | `BANLIST_OCG_TABLE_NAME` | `banlist_ocg`   |
    /// | `DB_MAX_CONNECTIONS`     | `16`            |
    /// | `DB_MIN_CONNECTIONS`     | `2`             |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`| `5`             |
    /// | `DB_IDLE_TIMEOUT_SECS`   | `60`            |
    /// | `CARD_SOURCE`            | `cardinfo.json` |
    /// | `SKIP_MIGRATIONS`        | `false`         |
    /// | `DEBUG_MODE`             | `false`         |
    /// | `ALLOWED_ORIGINS`        | empty           |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false)
        };

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = var_or("PORT", "4000")
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let defaults = TableNames::default();
        let tables = TableNames {
            cards: var_or("CARD_TABLE_NAME", &defaults.cards),
            images: var_or("IMAGES_TABLE_NAME", &defaults.images),
            banlist_tcg: var_or("BANLIST_TCG_TABLE_NAME", &defaults.banlist_tcg),
            banlist_ocg: var_or("BANLIST_OCG_TABLE_NAME", &defaults.banlist_ocg),
        };
        tables.validate()?;

        let number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a non-negative number", key)),
                None => Ok(default),
            }
        };
        let pool_defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: u32::try_from(number(
                "DB_MAX_CONNECTIONS",
                pool_defaults.max_connections.into(),
            )?)
            .context("DB_MAX_CONNECTIONS is too large")?,
            min_connections: u32::try_from(number(
                "DB_MIN_CONNECTIONS",
                pool_defaults.min_connections.into(),
            )?)
            .context("DB_MIN_CONNECTIONS is too large")?,
            acquire_timeout: Duration::from_secs(number(
                "DB_ACQUIRE_TIMEOUT_SECS",
                pool_defaults.acquire_timeout.as_secs(),
            )?),
            idle_timeout: Duration::from_secs(number(
                "DB_IDLE_TIMEOUT_SECS",
                pool_defaults.idle_timeout.as_secs(),
            )?),
        };
        pool.validate()?;

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            host: var_or("HOST", "127.0.0.1"),
            port,
            tables,
            pool,
            card_source: var_or("CARD_SOURCE", "cardinfo.json"),
            skip_migrations: flag("SKIP_MIGRATIONS"),
            debug_mode: flag("DEBUG_MODE"),
            allowed_origins,
        })
    }
}

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
