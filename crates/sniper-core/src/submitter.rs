//! Single-block bundle submission.
//!
//! One call to [`BundleSubmitter::submit`] makes exactly one relay submission
//! and one inclusion wait. It never retries: the next attempt is driven by the
//! next block.

use crate::SniperError;
use sniper_relay::RelayService;
use sniper_types::{truncate_id, BundleSimulation, SignedTransaction, SubmissionOutcome};
use std::sync::Arc;
use tracing::instrument;

/// Submits the signed purchase transaction as a one-transaction bundle.
pub struct BundleSubmitter {
	relay: Arc<RelayService>,
	transaction: SignedTransaction,
}

impl BundleSubmitter {
	pub fn new(relay: Arc<RelayService>, transaction: SignedTransaction) -> Self {
		Self { relay, transaction }
	}

	/// Submits for `target_block` and waits for the verdict.
	///
	/// A relay rejection is returned as an error and ends the run.
	#[instrument(skip(self), fields(tx_hash = %truncate_id(&self.transaction.hash.to_string())))]
	pub async fn submit(&self, target_block: u64) -> Result<SubmissionOutcome, SniperError> {
		let bundle = std::slice::from_ref(&self.transaction);
		let submission = self.relay.submit(bundle, target_block).await?;

		tracing::info!(
			target_block,
			bundle_hash = %submission.bundle_hash.as_deref().map(truncate_id).unwrap_or_default(),
			"Bundle submitted"
		);

		let outcome = self.relay.wait(&submission).await?;
		tracing::info!(target_block, outcome = %outcome, "Bundle resolved");
		Ok(outcome)
	}

	/// Dry-runs the bundle for `target_block`. Problems are logged only.
	pub async fn simulate(&self, target_block: u64) -> Option<BundleSimulation> {
		let bundle = std::slice::from_ref(&self.transaction);
		match self.relay.simulate(bundle, target_block).await {
			Ok(simulation) => {
				match &simulation.error {
					Some(error) => tracing::warn!(
						target_block,
						gas_used = simulation.total_gas_used,
						error = %error,
						"Bundle simulation failed"
					),
					None => tracing::info!(
						target_block,
						gas_used = simulation.total_gas_used,
						"Bundle simulation succeeded"
					),
				}
				Some(simulation)
			},
			Err(e) => {
				tracing::warn!(target_block, error = %e, "Bundle simulation unavailable");
				None
			},
		}
	}
}

