//! Chain access for the sniper.
//!
//! Everything the sniper needs to know about the chain goes through
//! [`ChainInterface`]: the head block, the latest base fee, the transactions in
//! a given block, account nonce and balance, and read-only contract calls.
//! [`ChainService`] wraps an implementation with the connectivity policy:
//! network failures are retried with exponential backoff for a bounded time,
//! after which the error is returned to the caller.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub mod watcher;

pub use watcher::BlockWatcher;

sol! {
	/// ERC-721 enumerable supply query.
	function totalSupply() external view returns (uint256);
}

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The RPC endpoint could not be reached or returned a transport error.
	/// Retried by [`ChainService`].
	#[error("Network error: {0}")]
	Network(String),
	/// The endpoint answered with something unusable. Never retried.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

/// Interface for chain RPC clients.
#[async_trait]
pub trait ChainInterface: Send + Sync {
	/// Latest block number.
	async fn get_block_number(&self) -> Result<u64, ChainError>;

	/// Base fee per gas of `block`, in wei.
	async fn get_base_fee(&self, block: u64) -> Result<u128, ChainError>;

	/// Hashes of the transactions in `block`, or `None` if the block does not
	/// exist yet.
	async fn get_block_transactions(&self, block: u64) -> Result<Option<Vec<B256>>, ChainError>;

	/// Next nonce for `address` as of the latest block.
	async fn get_nonce(&self, address: Address) -> Result<u64, ChainError>;

	/// Native balance of `address`, in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, ChainError>;

	/// Read-only contract call.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;
}

/// Chain access with bounded retries on network errors.
///
/// Wraps a [`ChainInterface`] implementation. Every call that fails with
/// [`ChainError::Network`] is retried with exponential backoff until it
/// succeeds or the retry window closes; any other error is returned at once.
pub struct ChainService {
	implementation: Box<dyn ChainInterface>,
	/// Longest time a single call keeps retrying before giving up.
	retry_max_elapsed: Duration,
}

impl ChainService {
	/// Creates a new ChainService.
	///
	/// # Arguments
	///
	/// * `implementation` - The RPC client calls are forwarded to
	/// * `retry_max_elapsed` - How long one call may keep retrying network
	///   errors before the last error is returned
	pub fn new(implementation: Box<dyn ChainInterface>, retry_max_elapsed: Duration) -> Self {
		Self {
			implementation,
			retry_max_elapsed,
		}
	}

	/// Runs `op` until it succeeds, fails permanently, or the retry window
	/// closes.
	async fn with_retry<T, F, Fut>(&self, what: &str, op: F) -> Result<T, ChainError>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<T, ChainError>>,
	{
		let policy = ExponentialBackoff {
			initial_interval: Duration::from_millis(100),
			max_interval: Duration::from_secs(2),
			max_elapsed_time: Some(self.retry_max_elapsed),
			..Default::default()
		};

		let op = &op;
		backoff::future::retry(policy, move || {
			let attempt = op();
			async move {
				attempt.await.map_err(|e| match e {
					ChainError::Network(_) => {
						tracing::warn!(call = what, error = %e, "RPC call failed, retrying");
						backoff::Error::transient(e)
					},
					other => backoff::Error::permanent(other),
				})
			}
		})
		.await
	}

	/// Latest block number.
	pub async fn get_block_number(&self) -> Result<u64, ChainError> {
		self.with_retry("eth_blockNumber", || self.implementation.get_block_number())
			.await
	}

	/// Base fee per gas of `block`, in wei.
	pub async fn get_base_fee(&self, block: u64) -> Result<u128, ChainError> {
		self.with_retry("eth_getBlockByNumber", || {
			self.implementation.get_base_fee(block)
		})
		.await
	}

	/// Transaction hashes of `block`, or `None` if it is not available yet.
	pub async fn get_block_transactions(&self, block: u64) -> Result<Option<Vec<B256>>, ChainError> {
		self.with_retry("eth_getBlockByNumber", || {
			self.implementation.get_block_transactions(block)
		})
		.await
	}

	/// Next nonce for `address`.
	pub async fn get_nonce(&self, address: Address) -> Result<u64, ChainError> {
		self.with_retry("eth_getTransactionCount", || {
			self.implementation.get_nonce(address)
		})
		.await
	}

	/// Native balance of `address`.
	pub async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
		self.with_retry("eth_getBalance", || self.implementation.get_balance(address))
			.await
	}

	/// Current `totalSupply()` of the sale contract.
	pub async fn total_supply(&self, contract: Address) -> Result<U256, ChainError> {
		let data: Bytes = totalSupplyCall {}.abi_encode().into();
		let result = self
			.with_retry("totalSupply", || {
				self.implementation.call(contract, data.clone())
			})
			.await?;

		if result.len() < 32 {
			return Err(ChainError::InvalidResponse(format!(
				"totalSupply returned {} bytes",
				result.len()
			)));
		}

		Ok(U256::from_be_slice(&result[..32]))
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Chain whose head advances by one block every time it is queried.
	pub(crate) struct AdvancingChain {
		pub head: AtomicU64,
		pub failures_left: AtomicUsize,
		pub supply_word: Mutex<Vec<u8>>,
	}

	impl AdvancingChain {
		pub fn new(head: u64) -> Self {
			Self {
				head: AtomicU64::new(head),
				failures_left: AtomicUsize::new(0),
				supply_word: Mutex::new(U256::from(19_000).to_be_bytes_vec()),
			}
		}
	}

	#[async_trait]
	impl ChainInterface for AdvancingChain {
		async fn get_block_number(&self) -> Result<u64, ChainError> {
			if self
				.failures_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
				.is_ok()
			{
				return Err(ChainError::Network("connection reset".into()));
			}
			Ok(self.head.fetch_add(1, Ordering::SeqCst))
		}

		async fn get_base_fee(&self, _block: u64) -> Result<u128, ChainError> {
			Ok(100_000_000_000)
		}

		async fn get_block_transactions(
			&self,
			block: u64,
		) -> Result<Option<Vec<B256>>, ChainError> {
			Ok((block <= self.head.load(Ordering::SeqCst)).then(Vec::new))
		}

		async fn get_nonce(&self, _address: Address) -> Result<u64, ChainError> {
			Ok(0)
		}

		async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
			Ok(U256::ZERO)
		}

		async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
			assert_eq!(&data[..], &totalSupplyCall::SELECTOR[..]);
			Ok(Bytes::from(self.supply_word.lock().unwrap().clone()))
		}
	}

	#[tokio::test]
	async fn test_total_supply_decodes_word() {
		let service = ChainService::new(Box::new(AdvancingChain::new(1)), Duration::from_secs(1));
		let supply = service.total_supply(Address::ZERO).await.unwrap();
		assert_eq!(supply, U256::from(19_000));
	}

	#[tokio::test]
	async fn test_total_supply_short_response() {
		let chain = AdvancingChain::new(1);
		*chain.supply_word.lock().unwrap() = vec![0u8; 4];
		let service = ChainService::new(Box::new(chain), Duration::from_secs(1));

		let result = service.total_supply(Address::ZERO).await;
		assert!(matches!(result, Err(ChainError::InvalidResponse(_))));
	}

	#[tokio::test]
	async fn test_network_errors_are_retried() {
		let chain = AdvancingChain::new(100);
		chain.failures_left.store(2, Ordering::SeqCst);
		let service = ChainService::new(Box::new(chain), Duration::from_secs(10));

		assert_eq!(service.get_block_number().await.unwrap(), 100);
	}

	#[tokio::test]
	async fn test_retries_are_bounded() {
		let chain = AdvancingChain::new(100);
		chain.failures_left.store(usize::MAX, Ordering::SeqCst);
		let service = ChainService::new(Box::new(chain), Duration::from_millis(50));

		let result = service.get_block_number().await;
		assert!(matches!(result, Err(ChainError::Network(_))));
	}
}
