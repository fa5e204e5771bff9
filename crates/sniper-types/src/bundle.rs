//! Bundle submission types.

use crate::SignedTransaction;
use alloy::primitives::U256;
use std::fmt;

/// Result of waiting on one bundle for its target block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
	/// The bundle's transaction landed in the target block.
	Included,
	/// The target block was produced without the bundle.
	NotIncludedInTargetBlock,
	/// The sender nonce moved past the bundle's nonce before the target block,
	/// meaning an earlier attempt already consumed it.
	NonceTooHigh,
}

impl fmt::Display for SubmissionOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Included => write!(f, "BundleIncluded"),
			Self::NotIncludedInTargetBlock => write!(f, "BlockPassedWithoutInclusion"),
			Self::NonceTooHigh => write!(f, "AccountNonceTooHigh"),
		}
	}
}

/// Handle to a bundle the relay accepted.
///
/// Carries everything the inclusion check needs: the target block and the
/// hashes and nonces of the bundled transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSubmission {
	/// Hash the relay assigned to the bundle, if it returned one.
	pub bundle_hash: Option<String>,
	/// The only block this bundle is valid for.
	pub target_block: u64,
	/// Transactions in bundle order.
	pub transactions: Vec<SignedTransaction>,
}

/// Outcome of simulating a bundle against the current chain head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSimulation {
	/// Total gas the bundle consumed.
	pub total_gas_used: u64,
	/// First transaction error or revert reason, if any.
	pub error: Option<String>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
	/// The purchase bundle was included.
	Included {
		/// Block the bundle landed in.
		block: u64,
	},
	/// The nonce was consumed by an earlier attempt, most likely an inclusion
	/// that was not observed directly.
	NonceAlreadyUsed {
		/// Block the last attempt targeted.
		block: u64,
	},
	/// The collection sold out before a bundle landed.
	SoldOut {
		/// Total supply observed.
		supply: U256,
	},
}

impl RunOutcome {
	/// Whether the purchase went through.
	pub fn is_success(&self) -> bool {
		!matches!(self, Self::SoldOut { .. })
	}

	/// Maps a terminal submission outcome for `block` to a run outcome.
	///
	/// Returns `None` for [`SubmissionOutcome::NotIncludedInTargetBlock`].
	pub fn from_submission(outcome: SubmissionOutcome, block: u64) -> Option<Self> {
		match outcome {
			SubmissionOutcome::Included => Some(Self::Included { block }),
			SubmissionOutcome::NonceTooHigh => Some(Self::NonceAlreadyUsed { block }),
			SubmissionOutcome::NotIncludedInTargetBlock => None,
		}
	}

	/// Process exit code for this outcome.
	///
	/// A sellout exits with 2 so scripts can tell it apart from a purchase.
	pub fn exit_code(&self) -> i32 {
		match self {
			Self::Included { .. } | Self::NonceAlreadyUsed { .. } => 0,
			Self::SoldOut { .. } => 2,
		}
	}
}
