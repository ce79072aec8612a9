//! Shade Configuration
//!
//! Shared configuration crate for the pool core and the CLI.
//!
//! Handles loading configuration from:
//! 1. SHADE_CONFIG env var (explicit path)
//! 2. ./shade.toml (current directory)
//! 3. ~/.shade/shade.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<ShadeConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "shade.toml";
const CONFIG_DIR_NAME: &str = ".shade";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_NAME: &str = "Shade";
const DEFAULT_SYMBOL: &str = "SHD";
const DEFAULT_DECIMALS: u8 = 18;
const DEFAULT_SUBTREE_HEIGHT: u8 = 16;
const DEFAULT_FINALIZED_HEIGHT: u8 = 20;
/// 1 token at 18 decimals
const DEFAULT_MINT_AMOUNT: u128 = 1_000_000_000_000_000_000;
const DEFAULT_MINT_PRICE: u128 = 10_000_000_000_000_000;
const DEFAULT_MAX_SUPPLY: u128 = 21_000_000 * DEFAULT_MINT_AMOUNT;

const DEFAULT_PRIMARY_RECIPIENT: &str =
    "0101010101010101010101010101010101010101010101010101010101010101";
const DEFAULT_SECONDARY_RECIPIENT: &str =
    "0202020202020202020202020202020202020202020202020202020202020202";
const DEFAULT_PRIMARY_SHARE_BPS: u16 = 9_000;

const DEFAULT_DB_PATH: &str = "./shade-db";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadeConfig {
    #[serde(default)]
    pub pool: PoolToml,
    #[serde(default)]
    pub fees: FeesToml,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Pool metadata, tree geometry and mint economics.
///
/// Amounts are decimal strings in TOML so that values above `i64::MAX`
/// survive the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolToml {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Height of the active subtree (h1)
    #[serde(default = "default_subtree_height")]
    pub subtree_height: u8,
    /// Height of the finalized tree (h2)
    #[serde(default = "default_finalized_height")]
    pub finalized_height: u8,
    #[serde(default = "default_mint_amount")]
    pub mint_amount: String,
    #[serde(default = "default_mint_price")]
    pub mint_price: String,
    #[serde(default = "default_max_supply")]
    pub max_supply: String,
}

impl Default for PoolToml {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            symbol: DEFAULT_SYMBOL.into(),
            decimals: DEFAULT_DECIMALS,
            subtree_height: DEFAULT_SUBTREE_HEIGHT,
            finalized_height: DEFAULT_FINALIZED_HEIGHT,
            mint_amount: default_mint_amount(),
            mint_price: default_mint_price(),
            max_supply: default_max_supply(),
        }
    }
}

fn default_name() -> String {
    DEFAULT_NAME.into()
}
fn default_symbol() -> String {
    DEFAULT_SYMBOL.into()
}
fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}
fn default_subtree_height() -> u8 {
    DEFAULT_SUBTREE_HEIGHT
}
fn default_finalized_height() -> u8 {
    DEFAULT_FINALIZED_HEIGHT
}
fn default_mint_amount() -> String {
    DEFAULT_MINT_AMOUNT.to_string()
}
fn default_mint_price() -> String {
    DEFAULT_MINT_PRICE.to_string()
}
fn default_max_supply() -> String {
    DEFAULT_MAX_SUPPLY.to_string()
}

/// Fee recipients (hex account ids) and the primary recipient's share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesToml {
    #[serde(default = "default_primary_recipient")]
    pub primary_recipient: String,
    #[serde(default = "default_secondary_recipient")]
    pub secondary_recipient: String,
    /// Share of every distribution paid to the primary recipient, in basis points
    #[serde(default = "default_primary_share_bps")]
    pub primary_share_bps: u16,
}

impl Default for FeesToml {
    fn default() -> Self {
        Self {
            primary_recipient: DEFAULT_PRIMARY_RECIPIENT.into(),
            secondary_recipient: DEFAULT_SECONDARY_RECIPIENT.into(),
            primary_share_bps: DEFAULT_PRIMARY_SHARE_BPS,
        }
    }
}

fn default_primary_recipient() -> String {
    DEFAULT_PRIMARY_RECIPIENT.into()
}
fn default_secondary_recipient() -> String {
    DEFAULT_SECONDARY_RECIPIENT.into()
}
fn default_primary_share_bps() -> u16 {
    DEFAULT_PRIMARY_SHARE_BPS
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Keep the ledgers in memory only
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.into(),
            in_memory: false,
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl ShadeConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("SHADE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("SHADE_CONFIG points to missing file: {}", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Pool
        env_string("SHADE_NAME", &mut self.pool.name);
        env_string("SHADE_SYMBOL", &mut self.pool.symbol);
        env_parse("SHADE_DECIMALS", &mut self.pool.decimals);
        env_parse("SHADE_SUBTREE_HEIGHT", &mut self.pool.subtree_height);
        env_parse("SHADE_FINALIZED_HEIGHT", &mut self.pool.finalized_height);
        env_string("SHADE_MINT_AMOUNT", &mut self.pool.mint_amount);
        env_string("SHADE_MINT_PRICE", &mut self.pool.mint_price);
        env_string("SHADE_MAX_SUPPLY", &mut self.pool.max_supply);

        // Fees
        env_string("SHADE_FEE_PRIMARY", &mut self.fees.primary_recipient);
        env_string("SHADE_FEE_SECONDARY", &mut self.fees.secondary_recipient);
        env_parse("SHADE_FEE_PRIMARY_BPS", &mut self.fees.primary_share_bps);

        // Database
        env_string("SHADE_DB_PATH", &mut self.database.path);
        if let Some(v) = env_bool("SHADE_IN_MEMORY") {
            self.database.in_memory = v;
        }
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static ShadeConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: ShadeConfig) -> Result<(), ShadeConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `ShadeConfig::global()`.
#[inline]
pub fn global_config() -> &'static ShadeConfig {
    ShadeConfig::global()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShadeConfig::default();
        assert_eq!(config.pool.name, DEFAULT_NAME);
        assert_eq!(config.pool.subtree_height, DEFAULT_SUBTREE_HEIGHT);
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert!(!config.database.in_memory);
        assert_eq!(config.fees.primary_share_bps, DEFAULT_PRIMARY_SHARE_BPS);
    }

    #[test]
    fn test_generate_sample() {
        let sample = ShadeConfig::generate_sample();
        assert!(sample.contains("[pool]"));
        assert!(sample.contains("[fees]"));
        assert!(sample.contains("[database]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = ShadeConfig::generate_sample();
        let parsed: ShadeConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.pool.symbol, DEFAULT_SYMBOL);
        assert_eq!(parsed.pool.max_supply, DEFAULT_MAX_SUPPLY.to_string());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: ShadeConfig = toml::from_str(
            r#"
            [pool]
            subtree_height = 2
            mint_price = "5"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.pool.subtree_height, 2);
        assert_eq!(parsed.pool.mint_price, "5");
        assert_eq!(parsed.pool.finalized_height, DEFAULT_FINALIZED_HEIGHT);
        assert_eq!(parsed.fees.primary_recipient, DEFAULT_PRIMARY_RECIPIENT);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\npath = \"/tmp/shade-test\"\n").unwrap();

        let config = ShadeConfig::load_from(&path).unwrap();
        assert_eq!(config.pool.symbol, DEFAULT_SYMBOL);
        assert!(config.database.path == "/tmp/shade-test" || env::var("SHADE_DB_PATH").is_ok());
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let err = ShadeConfig::load_from(Path::new("/nonexistent/shade.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
