//! Formatting and unit helpers shared across the sniper crates.

pub mod formatting;
pub mod units;

pub use formatting::{truncate_id, with_0x_prefix, without_0x_prefix};
pub use units::{format_gwei, gwei_to_wei, parse_ether, UnitError};

/// Current Unix timestamp in seconds, or 0 if the clock is before the epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}
