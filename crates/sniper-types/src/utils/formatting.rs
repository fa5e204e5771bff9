//! Hex string helpers used when logging hashes and parsing configured call data.

/// Shortens a hash for log lines: first 10 characters followed by "..".
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Adds a "0x" prefix unless one (in either case) is already present.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading "0x" or "0X".
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x12345678"), "0x12345678");
		assert_eq!(
			truncate_id("0x8a3f1c2d9e0b7a6f5e4d3c2b1a0f9e8d"),
			"0x8a3f1c2d.."
		);
	}

	#[test]
	fn test_prefix_round_trip() {
		let data = "f8b4d9810000000000000000000000000000000000000000000000000000000000000005";
		assert_eq!(with_0x_prefix(data), format!("0x{}", data));
		assert_eq!(with_0x_prefix(&with_0x_prefix(data)), format!("0x{}", data));
		assert_eq!(without_0x_prefix(&with_0x_prefix(data)), data);
		assert_eq!(without_0x_prefix("0XABCD"), "ABCD");
	}
}
