//! Configuration for the sniper.
//!
//! Configuration is a single TOML file. Anything that differs between
//! deployments (chain id, RPC endpoint, keys, relay endpoint) is normally
//! injected from the environment with `${VAR}` or `${VAR:-default}`
//! references, which are resolved before the TOML is parsed.
//!
//! Units are part of the field names where they are not obvious: the sale
//! start is a Unix timestamp in seconds, fees are in gwei, the purchase value
//! is in ether.

use alloy::primitives::{Address, Bytes, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sniper_types::{gwei_to_wei, parse_ether, with_0x_prefix, SecretString};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level sniper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain and RPC endpoint.
	pub network: NetworkConfig,
	/// Signing keys.
	pub account: AccountConfig,
	/// Private bundle relay.
	pub relay: RelayConfig,
	/// The sale being sniped.
	pub sale: SaleConfig,
	/// Fee parameters.
	#[serde(default)]
	pub fees: FeeConfig,
	/// Retry loop behaviour.
	#[serde(default)]
	pub sniper: SniperConfig,
}

/// Chain and RPC endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Chain id the purchase transaction is signed for.
	pub chain_id: u64,
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
	/// How often the block watcher polls for a new head, in milliseconds.
	#[serde(default = "default_block_poll_interval_ms")]
	pub block_poll_interval_ms: u64,
}

fn default_block_poll_interval_ms() -> u64 {
	1000
}

/// Signing keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Private key of the wallet that pays for the purchase.
	pub private_key: SecretString,
	/// Key used only to sign relay requests. Defaults to `private_key`.
	#[serde(default)]
	pub relay_signing_key: Option<SecretString>,
}

impl AccountConfig {
	/// The key that authenticates relay requests.
	pub fn relay_key(&self) -> &SecretString {
		self.relay_signing_key
			.as_ref()
			.filter(|key| !key.is_empty())
			.unwrap_or(&self.private_key)
	}
}

/// Private bundle relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
	/// Relay JSON-RPC endpoint.
	#[serde(default = "default_relay_url")]
	pub url: String,
	/// Upper bound on waiting for one bundle's verdict, in seconds.
	#[serde(default = "default_inclusion_timeout_seconds")]
	pub inclusion_timeout_seconds: u64,
	/// Simulate the bundle once before the first submission.
	#[serde(default)]
	pub simulate_before_submit: bool,
}

fn default_relay_url() -> String {
	"https://relay.flashbots.net".to_string()
}

fn default_inclusion_timeout_seconds() -> u64 {
	60
}

/// The sale being sniped.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaleConfig {
	/// Sale start as a Unix timestamp in seconds.
	pub start_timestamp: u64,
	/// Sale contract address.
	pub contract_address: String,
	/// Hex encoded mint call.
	pub call_data: String,
	/// Native currency sent with the mint call, in ether (e.g. "0.5").
	#[serde(default = "default_value_eth")]
	pub value_eth: String,
	/// Gas limit for the mint call.
	#[serde(default = "default_gas_limit")]
	pub gas_limit: u64,
	/// Total supply at which the sale counts as sold out.
	#[serde(default = "default_sellout_supply")]
	pub sellout_supply: u64,
}

fn default_value_eth() -> String {
	"0".to_string()
}

fn default_gas_limit() -> u64 {
	150_000
}

fn default_sellout_supply() -> u64 {
	19_995
}

impl SaleConfig {
	/// Parsed sale contract address.
	pub fn contract(&self) -> Result<Address, ConfigError> {
		self.contract_address.parse().map_err(|e| {
			ConfigError::Validation(format!(
				"Invalid contract_address '{}': {}",
				self.contract_address, e
			))
		})
	}

	/// Decoded mint call data.
	pub fn input(&self) -> Result<Bytes, ConfigError> {
		with_0x_prefix(self.call_data.trim())
			.parse::<Bytes>()
			.map_err(|e| ConfigError::Validation(format!("Invalid call_data: {}", e)))
	}

	/// Purchase value in wei.
	pub fn value_wei(&self) -> Result<U256, ConfigError> {
		parse_ether(&self.value_eth).map_err(|e| ConfigError::Validation(e.to_string()))
	}
}

/// Fee parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeeConfig {
	/// Priority fee offered to the block producer, in gwei.
	#[serde(default = "default_priority_fee_gwei")]
	pub priority_fee_gwei: u64,
	/// Number of blocks of base fee growth the max fee must cover.
	#[serde(default = "default_blocks_in_future")]
	pub blocks_in_future: u32,
	/// Hard cap on the projected base fee, in gwei.
	#[serde(default)]
	pub max_base_fee_gwei: Option<u64>,
}

fn default_priority_fee_gwei() -> u64 {
	3
}

fn default_blocks_in_future() -> u32 {
	10
}

impl Default for FeeConfig {
	fn default() -> Self {
		Self {
			priority_fee_gwei: default_priority_fee_gwei(),
			blocks_in_future: default_blocks_in_future(),
			max_base_fee_gwei: None,
		}
	}
}

impl FeeConfig {
	/// Priority fee in wei.
	pub fn priority_fee_wei(&self) -> u128 {
		gwei_to_wei(self.priority_fee_gwei)
	}

	/// Base fee cap in wei, if configured.
	pub fn max_base_fee_wei(&self) -> Option<u128> {
		self.max_base_fee_gwei.map(gwei_to_wei)
	}
}

/// Retry loop behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SniperConfig {
	/// Drop queued block notifications older than the newest one.
	#[serde(default = "default_true")]
	pub supersede_stale_blocks: bool,
	/// Give up on a failing RPC call after retrying for this many seconds.
	#[serde(default = "default_rpc_retry_max_elapsed_seconds")]
	pub rpc_retry_max_elapsed_seconds: u64,
	/// Refuse to start when the wallet cannot cover value plus max gas cost.
	#[serde(default = "default_true")]
	pub check_balance: bool,
}

fn default_true() -> bool {
	true
}

fn default_rpc_retry_max_elapsed_seconds() -> u64 {
	30
}

impl Default for SniperConfig {
	fn default() -> Self {
		Self {
			supersede_stale_blocks: true,
			rpc_retry_max_elapsed_seconds: default_rpc_retry_max_elapsed_seconds(),
			check_balance: true,
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		resolved.push_str(&input[last..full_match.start()]);
		resolved.push_str(&value);
		last = full_match.end();
	}
	resolved.push_str(&input[last..]);

	Ok(resolved)
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
	if url.starts_with("http://") || url.starts_with("https://") {
		Ok(())
	} else {
		Err(ConfigError::Validation(format!(
			"{} must start with http:// or https://, got '{}'",
			field, url
		)))
	}
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Checks every field the sniper will rely on mid-sale.
	///
	/// Anything that would only fail after the sale opened (a bad address, bad
	/// call data, an unparseable value) is rejected here instead.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation("chain_id cannot be 0".into()));
		}
		validate_http_url("network.rpc_url", &self.network.rpc_url)?;
		if self.network.block_poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"block_poll_interval_ms must be greater than 0".into(),
			));
		}

		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"account.private_key cannot be empty".into(),
			));
		}

		validate_http_url("relay.url", &self.relay.url)?;
		if self.relay.inclusion_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"inclusion_timeout_seconds must be greater than 0".into(),
			));
		}

		self.sale.contract()?;
		if self.sale.input()?.is_empty() {
			return Err(ConfigError::Validation("call_data cannot be empty".into()));
		}
		self.sale.value_wei()?;
		if self.sale.gas_limit == 0 {
			return Err(ConfigError::Validation("gas_limit cannot be 0".into()));
		}
		if self.sale.sellout_supply == 0 {
			return Err(ConfigError::Validation("sellout_supply cannot be 0".into()));
		}

		if self.fees.blocks_in_future > 100 {
			return Err(ConfigError::Validation(format!(
				"blocks_in_future must be at most 100, got {}",
				self.fees.blocks_in_future
			)));
		}
		if self.fees.max_base_fee_gwei == Some(0) {
			return Err(ConfigError::Validation(
				"max_base_fee_gwei must be greater than 0 when set".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from TOML text. Environment variables are resolved
/// first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
