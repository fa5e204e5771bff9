//! Bundle inclusion resolution.
//!
//! While the chain is still below the target block, the only thing that can
//! settle a bundle early is its sender nonce moving past the bundle's nonce:
//! some earlier attempt was mined, so this one can never land. Once the target
//! block exists, the bundle was included iff every bundled transaction hash is
//! in that block.

use crate::RelayError;
use alloy::primitives::Address;
use sniper_chain::ChainService;
use sniper_types::{BundleSubmission, SubmissionOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Resolves [`SubmissionOutcome`]s by polling the chain.
#[derive(Clone)]
pub struct InclusionResolver {
	chain: Arc<ChainService>,
	poll_interval: Duration,
}

impl InclusionResolver {
	/// Creates a resolver polling every `poll_interval`.
	pub fn new(chain: Arc<ChainService>, poll_interval: Duration) -> Self {
		Self {
			chain,
			poll_interval,
		}
	}

	/// Polls until the bundle's verdict is known.
	pub async fn wait(&self, submission: &BundleSubmission) -> Result<SubmissionOutcome, RelayError> {
		let min_nonces = minimum_nonces(submission);
		let mut interval = tokio::time::interval(self.poll_interval);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

		loop {
			interval.tick().await;

			let head = self.chain.get_block_number().await?;
			if head < submission.target_block {
				if self.any_nonce_consumed(&min_nonces).await? {
					return Ok(SubmissionOutcome::NonceTooHigh);
				}
				continue;
			}

			// The head can be reported before the block body is served.
			let Some(hashes) = self
				.chain
				.get_block_transactions(submission.target_block)
				.await?
			else {
				continue;
			};

			let included = submission
				.transactions
				.iter()
				.all(|tx| hashes.contains(&tx.hash));

			return Ok(if included {
				SubmissionOutcome::Included
			} else {
				SubmissionOutcome::NotIncludedInTargetBlock
			});
		}
	}

	async fn any_nonce_consumed(&self, min_nonces: &HashMap<Address, u64>) -> Result<bool, RelayError> {
		for (account, nonce) in min_nonces {
			let next_nonce = self.chain.get_nonce(*account).await?;
			if next_nonce > *nonce {
				tracing::debug!(
					account = %account,
					bundle_nonce = nonce,
					account_nonce = next_nonce,
					"Account nonce moved past bundle"
				);
				return Ok(true);
			}
		}
		Ok(false)
	}
}

/// Lowest bundled nonce per sender.
fn minimum_nonces(submission: &BundleSubmission) -> HashMap<Address, u64> {
	let mut nonces: HashMap<Address, u64> = HashMap::new();
	for tx in &submission.transactions {
		nonces
			.entry(tx.from)
			.and_modify(|nonce| *nonce = (*nonce).min(tx.nonce))
			.or_insert(tx.nonce);
	}
	nonces
}
