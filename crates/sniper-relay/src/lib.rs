//! Private bundle relay access.
//!
//! A relay accepts a bundle of signed transactions for one specific block and
//! forwards it to block builders without exposing it to the public mempool.
//! The relay never reports inclusion itself; [`RelayInterface::wait_for_inclusion`]
//! resolves a bundle's fate by watching the chain.

use async_trait::async_trait;
use sniper_account::AccountError;
use sniper_chain::ChainError;
use sniper_types::{BundleSimulation, BundleSubmission, SignedTransaction, SubmissionOutcome};
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod flashbots;
}

pub mod inclusion;

pub use inclusion::InclusionResolver;

/// Errors that can occur while submitting to a relay.
#[derive(Debug, Error)]
pub enum RelayError {
	/// The relay refused the request (malformed bundle, bad signature, ...).
	#[error("Relay rejected request: {0}")]
	Rejected(String),
	/// The relay could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The relay answered with something that is not a valid response.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// Signing the request envelope failed.
	#[error("Signing error: {0}")]
	Signing(#[from] AccountError),
	/// Chain access failed while resolving inclusion.
	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),
}

/// Interface for bundle relays.
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Submits `transactions` as a bundle valid only in `target_block`.
	async fn send_bundle(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSubmission, RelayError>;

	/// Waits until the fate of `submission` is known.
	async fn wait_for_inclusion(
		&self,
		submission: &BundleSubmission,
	) -> Result<SubmissionOutcome, RelayError>;

	/// Simulates `transactions` on top of the latest state as if mined in
	/// `target_block`.
	async fn simulate_bundle(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSimulation, RelayError>;
}

/// Relay access with a deadline on every inclusion wait.
///
/// Submissions and simulations are forwarded unchanged to the wrapped
/// [`RelayInterface`]; only [`RelayService::wait`] adds behavior.
pub struct RelayService {
	implementation: Box<dyn RelayInterface>,
	inclusion_timeout: Duration,
}

impl RelayService {
	/// Creates a new RelayService.
	///
	/// # Arguments
	///
	/// * `implementation` - The relay client to forward calls to
	/// * `inclusion_timeout` - Upper bound on a single inclusion wait
	pub fn new(implementation: Box<dyn RelayInterface>, inclusion_timeout: Duration) -> Self {
		Self {
			implementation,
			inclusion_timeout,
		}
	}

	/// Submits a bundle for `target_block`.
	pub async fn submit(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSubmission, RelayError> {
		self.implementation
			.send_bundle(transactions, target_block)
			.await
	}

	/// Waits for the bundle's verdict.
	///
	/// A wait that runs past the inclusion timeout counts as not included; the
	/// next block triggers a fresh attempt anyway.
	///
	/// # Arguments
	///
	/// * `submission` - The accepted bundle to resolve
	///
	/// # Returns
	///
	/// The bundle's [`SubmissionOutcome`], or an error if the relay or the
	/// chain failed while resolving it.
	pub async fn wait(&self, submission: &BundleSubmission) -> Result<SubmissionOutcome, RelayError> {
		match tokio::time::timeout(
			self.inclusion_timeout,
			self.implementation.wait_for_inclusion(submission),
		)
		.await
		{
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(
					target_block = submission.target_block,
					timeout_secs = self.inclusion_timeout.as_secs(),
					"Timed out waiting for bundle verdict"
				);
				Ok(SubmissionOutcome::NotIncludedInTargetBlock)
			},
		}
	}

	/// Simulates a bundle for `target_block`.
	pub async fn simulate(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSimulation, RelayError> {
		self.implementation
			.simulate_bundle(transactions, target_block)
			.await
	}
}
