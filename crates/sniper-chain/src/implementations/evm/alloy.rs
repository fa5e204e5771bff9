//! Alloy-based chain client.
//!
//! Talks JSON-RPC over HTTP to a single EVM endpoint.

use crate::{ChainError, ChainInterface};
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;

/// Chain client backed by an alloy HTTP provider.
pub struct AlloyChain {
	provider: RootProvider,
}

impl AlloyChain {
	/// Creates a client for `rpc_url`. No request is made until first use.
	pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
		let url: reqwest::Url = rpc_url
			.parse()
			.map_err(|e| ChainError::Network(format!("Invalid RPC URL: {}", e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
		})
	}
}

#[async_trait]
impl ChainInterface for AlloyChain {
	async fn get_block_number(&self) -> Result<u64, ChainError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get block number: {}", e)))
	}

	async fn get_base_fee(&self, block: u64) -> Result<u128, ChainError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Number(block))
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get block {}: {}", block, e)))?
			.ok_or_else(|| ChainError::InvalidResponse(format!("Block {} not found", block)))?;

		block
			.header
			.base_fee_per_gas
			.map(u128::from)
			.ok_or_else(|| {
				ChainError::InvalidResponse(format!(
					"Block {} has no base fee (pre-London chain?)",
					block.header.number
				))
			})
	}

	async fn get_block_transactions(&self, block: u64) -> Result<Option<Vec<B256>>, ChainError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Number(block))
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get block {}: {}", block, e)))?;

		Ok(block.map(|block| block.transactions.hashes().collect()))
	}

	async fn get_nonce(&self, address: Address) -> Result<u64, ChainError> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
		let request = TransactionRequest::default()
			.to(to)
			.input(TransactionInput::new(data));

		self.provider
			.call(request)
			.await
			.map_err(|e| ChainError::Network(format!("Failed to call {}: {}", to, e)))
	}
}

/// Creates the HTTP chain client.
pub fn create_chain(rpc_url: &str) -> Result<Box<dyn ChainInterface>, ChainError> {
	Ok(Box::new(AlloyChain::new(rpc_url)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejects_malformed_url() {
		assert!(matches!(
			AlloyChain::new("not a url"),
			Err(ChainError::Network(_))
		));
	}

	#[test]
	fn test_accepts_http_url() {
		assert!(AlloyChain::new("http://localhost:8545").is_ok());
	}
}
