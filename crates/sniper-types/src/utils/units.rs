//! Wei/gwei/ether conversions.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use thiserror::Error;

/// Wei per gwei.
pub const GWEI: u128 = 1_000_000_000;

/// Errors from unit parsing.
#[derive(Debug, Error)]
pub enum UnitError {
	/// The amount could not be parsed.
	#[error("Invalid amount '{0}': {1}")]
	Invalid(String, String),
}

/// Parses a decimal ether amount such as "0.5" into wei.
pub fn parse_ether(amount: &str) -> Result<U256, UnitError> {
	parse_units(amount.trim(), "ether")
		.map(Into::into)
		.map_err(|e| UnitError::Invalid(amount.to_string(), e.to_string()))
}

/// Converts whole gwei into wei.
pub fn gwei_to_wei(gwei: u64) -> u128 {
	gwei as u128 * GWEI
}

/// Formats a wei amount as gwei, dropping trailing zero decimals.
pub fn format_gwei(wei: u128) -> String {
	match format_units(U256::from(wei), "gwei") {
		Ok(s) => {
			let trimmed = s.trim_end_matches('0').trim_end_matches('.');
			if trimmed.is_empty() {
				"0".to_string()
			} else {
				trimmed.to_string()
			}
		}
		Err(_) => wei.to_string(),
	}
}
