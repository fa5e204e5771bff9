//! Gas fee parameters for the purchase transaction.
//!
//! The max fee covers the worst case base fee `blocks_in_future` blocks from
//! now. EIP-1559 lets the base fee rise by at most 12.5% per block, and the
//! difference between the max fee and the base fee actually charged is
//! refunded, so generous headroom costs nothing.

use sniper_config::FeeConfig;
use sniper_types::format_gwei;

/// Per-block base fee growth bound, as a ratio.
const BASE_FEE_GROWTH_NUMERATOR: u128 = 1125;
const BASE_FEE_GROWTH_DENOMINATOR: u128 = 1000;

/// Highest base fee reachable `blocks_in_future` blocks after a block with
/// `base_fee`.
pub fn max_base_fee_in_future_block(base_fee: u128, blocks_in_future: u32) -> u128 {
	let mut fee = base_fee;
	for _ in 0..blocks_in_future {
		let grown = match fee.checked_mul(BASE_FEE_GROWTH_NUMERATOR) {
			Some(scaled) => scaled / BASE_FEE_GROWTH_DENOMINATOR,
			None => (fee / BASE_FEE_GROWTH_DENOMINATOR).saturating_mul(BASE_FEE_GROWTH_NUMERATOR),
		};
		fee = grown.saturating_add(1);
	}
	fee
}

/// Fee fields of an EIP-1559 transaction, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
	/// Projected base fee after clamping.
	pub max_base_fee: u128,
	pub max_fee_per_gas: u128,
	pub max_priority_fee_per_gas: u128,
}

/// Derives [`Fees`] from the latest base fee.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
	priority_fee: u128,
	blocks_in_future: u32,
	max_base_fee_cap: Option<u128>,
}

impl FeeCalculator {
	pub fn new(priority_fee: u128, blocks_in_future: u32, max_base_fee_cap: Option<u128>) -> Self {
		Self {
			priority_fee,
			blocks_in_future,
			max_base_fee_cap,
		}
	}

	pub fn from_config(config: &FeeConfig) -> Self {
		Self::new(
			config.priority_fee_wei(),
			config.blocks_in_future,
			config.max_base_fee_wei(),
		)
	}

	pub fn compute(&self, base_fee: u128) -> Fees {
		let projected = max_base_fee_in_future_block(base_fee, self.blocks_in_future);
		let max_base_fee = match self.max_base_fee_cap {
			Some(cap) if projected > cap => {
				tracing::warn!(
					projected_gwei = %format_gwei(projected),
					cap_gwei = %format_gwei(cap),
					"Projected base fee clamped to cap"
				);
				cap
			},
			_ => projected,
		};

		Fees {
			max_base_fee,
			max_fee_per_gas: self.priority_fee.saturating_add(max_base_fee),
			max_priority_fee_per_gas: self.priority_fee,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sniper_types::gwei_to_wei;

	#[test]
	fn test_projection_matches_compounded_growth() {
		// 100 gwei over 10 blocks: 100 * 1.125^10 = 324.73 gwei, plus 1 wei per step.
		let projected = max_base_fee_in_future_block(gwei_to_wei(100), 10);
		assert!(projected > 324_732_000_000, "{}", projected);
		assert!(projected < 324_733_000_000, "{}", projected);
	}

	#[test]
	fn test_zero_window_is_identity() {
		assert_eq!(max_base_fee_in_future_block(12_345, 0), 12_345);
	}

	#[test]
	fn test_scenario_fee_fields() {
		let calculator = FeeCalculator::new(gwei_to_wei(3), 10, None);
		let fees = calculator.compute(gwei_to_wei(100));

		assert_eq!(fees.max_priority_fee_per_gas, gwei_to_wei(3));
		assert_eq!(fees.max_fee_per_gas, fees.max_base_fee + gwei_to_wei(3));
		assert!(fees.max_fee_per_gas > gwei_to_wei(327));
		assert!(fees.max_fee_per_gas < gwei_to_wei(328));
	}

	#[test]
	fn test_cap_clamps_projection() {
		let calculator = FeeCalculator::new(gwei_to_wei(3), 10, Some(gwei_to_wei(200)));
		let fees = calculator.compute(gwei_to_wei(100));

		assert_eq!(fees.max_base_fee, gwei_to_wei(200));
		assert_eq!(fees.max_fee_per_gas, gwei_to_wei(203));
	}

	#[test]
	fn test_cap_above_projection_is_ignored() {
		let uncapped = FeeCalculator::new(gwei_to_wei(3), 10, None).compute(gwei_to_wei(100));
		let capped =
			FeeCalculator::new(gwei_to_wei(3), 10, Some(gwei_to_wei(1_000))).compute(gwei_to_wei(100));
		assert_eq!(uncapped, capped);
	}

	#[test]
	fn test_monotonic_in_base_fee_and_window() {
		let base_fees = [0u128, 1, 7, 1_000, gwei_to_wei(1), gwei_to_wei(250)];
		for window in 0..20u32 {
			for pair in base_fees.windows(2) {
				assert!(
					max_base_fee_in_future_block(pair[0], window)
						<= max_base_fee_in_future_block(pair[1], window)
				);
			}
			for fee in base_fees {
				assert!(
					max_base_fee_in_future_block(fee, window)
						<= max_base_fee_in_future_block(fee, window + 1)
				);
			}
		}
	}

	#[test]
	fn test_max_fee_never_below_priority_fee() {
		let calculator = FeeCalculator::new(gwei_to_wei(3), 0, Some(0));
		let fees = calculator.compute(0);
		assert_eq!(fees.max_fee_per_gas, gwei_to_wei(3));
		assert!(fees.max_fee_per_gas >= fees.max_priority_fee_per_gas);
	}

	#[test]
	fn test_huge_base_fee_saturates() {
		let fees = FeeCalculator::new(gwei_to_wei(3), 100, None).compute(u128::MAX / 2);
		assert_eq!(fees.max_fee_per_gas, u128::MAX);
	}
}
