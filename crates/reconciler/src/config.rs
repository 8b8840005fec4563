//! Configuration management for the FactHound reconciler.
//!
//! This module handles loading configuration from:
//! - TOML files
//! - Environment variables referenced as `${VAR_NAME}` (outside comments)
//! - Default values (fallbacks)

use alloy::primitives::Address;
use anyhow::{Context, Result};
use facthound_core::parse_checksummed_address;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Main configuration for the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain node configuration
    pub network: NetworkConfig,

    /// Contract ABI configuration
    #[serde(default)]
    pub contract: ContractConfig,

    /// Reconciliation engine settings
    pub engine: EngineConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chain node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ethereum RPC URL (credentials may be embedded via `${VAR}`)
    pub rpc_url: String,

    /// Chain ID the RPC endpoint must report (e.g., 11155111 for Sepolia)
    pub chain_id: u64,

    /// Upper bound for a single view call, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

/// Contract ABI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Path to the compiled FactHound artifact or bare ABI JSON.
    ///
    /// When set, the ABI is checked at startup for the view functions the engine calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_path: Option<String>,
}

/// Settings injected into the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Addresses trusted as owners of FactHound contracts, EIP-55 checksummed
    #[serde(deserialize_with = "deserialize_checksummed_owners")]
    pub allowed_owners: Vec<Address>,

    /// Re-check `owner()` when confirming a selection
    #[serde(default)]
    pub enforce_owner_on_selection: bool,
}

impl EngineConfig {
    /// Create engine settings with the given allow-list and default flags.
    pub fn new(allowed_owners: Vec<Address>) -> Self {
        Self {
            allowed_owners,
            enforce_owner_on_selection: false,
        }
    }

    /// Whether `owner` is one of the allow-listed contract owners.
    pub fn is_allowed_owner(&self, owner: &Address) -> bool {
        self.allowed_owners.contains(owner)
    }
}

fn deserialize_checksummed_owners<'de, D>(deserializer: D) -> Result<Vec<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|owner| parse_checksummed_address(owner).map_err(serde::de::Error::custom))
        .collect()
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://facthound.db")
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_call_timeout_secs() -> u64 {
    15
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax, e.g.
    /// `rpc_url = "https://eth-sepolia.g.alchemy.com/v2/${ALCHEMY_API_KEY}"`.
    ///
    /// # Example
    /// ```no_run
    /// # use facthound_reconciler::config::Config;
    /// let config = Config::from_file("reconciler.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string (no environment expansion).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.trim().is_empty() {
            anyhow::bail!("Network RPC URL cannot be empty");
        }
        if self.network.chain_id == 0 {
            anyhow::bail!("Chain ID must be non-zero");
        }
        if self.network.call_timeout_secs == 0 {
            anyhow::bail!("Network call_timeout_secs must be > 0");
        }

        if let Some(abi_path) = &self.contract.abi_path {
            if abi_path.trim().is_empty() {
                anyhow::bail!("Contract abi_path cannot be empty when provided");
            }
        }

        if self.engine.allowed_owners.is_empty() {
            anyhow::bail!("Engine allowed_owners must list at least one address");
        }
        if let Some(zero) = self.engine.allowed_owners.iter().find(|a| a.is_zero()) {
            anyhow::bail!("Engine allowed_owners cannot contain the zero address ({})", zero);
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be > 0");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot exceed max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }
}

/// Expand `${VAR_NAME}` placeholders from the process environment.
///
/// Placeholders inside TOML comments are left untouched so that commented examples do
/// not require the variable to be set. A `#` inside a string does not start a comment.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let mut expanded = String::with_capacity(input.len());
    let mut multiline: Option<&'static [u8]> = None;

    for (idx, line) in input.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        match comment_start(line, &mut multiline) {
            Some(pos) => {
                expanded.push_str(&expand_placeholders(&line[..pos], line_no)?);
                expanded.push_str(&line[pos..]);
            }
            None => expanded.push_str(&expand_placeholders(line, line_no)?),
        }
    }

    Ok(expanded)
}

/// Byte offset of the `#` that opens a comment on this line, if any.
///
/// `multiline` carries an open `"""`/`'''` string across lines.
fn comment_start(line: &str, multiline: &mut Option<&'static [u8]>) -> Option<usize> {
    const BASIC_ML: &[u8] = b"\"\"\"";
    const LITERAL_ML: &[u8] = b"'''";

    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];

        if let Some(delim) = *multiline {
            if rest.starts_with(delim) {
                *multiline = None;
                i += 3;
            } else if bytes[i] == b'\\' && delim == BASIC_ML {
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        match quote {
            Some(q) => {
                if bytes[i] == b'\\' && q == b'"' {
                    i += 2;
                    continue;
                }
                if bytes[i] == q {
                    quote = None;
                }
            }
            None => {
                if rest.starts_with(BASIC_ML) {
                    *multiline = Some(BASIC_ML);
                    i += 3;
                    continue;
                }
                if rest.starts_with(LITERAL_ML) {
                    *multiline = Some(LITERAL_ML);
                    i += 3;
                    continue;
                }
                match bytes[i] {
                    b'"' | b'\'' => quote = Some(bytes[i]),
                    b'#' => return Some(i),
                    _ => {}
                }
            }
        }
        i += 1;
    }

    None
}

fn expand_placeholders(text: &str, line_no: usize) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            anyhow::bail!(
                "Unclosed environment variable placeholder on line {}",
                line_no
            );
        };

        let name = &after[..end];
        if name.is_empty() {
            anyhow::bail!("Empty environment variable name on line {}", line_no);
        }

        let value = std::env::var(name).with_context(|| {
            format!(
                "Environment variable '{}' is not set (referenced on line {})",
                name, line_no
            )
        })?;
        out.push_str(&value);

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
