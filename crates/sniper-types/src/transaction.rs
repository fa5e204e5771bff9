//! Purchase transaction types.
//!
//! A [`PendingTransaction`] is built once, after the sale opens, and is then
//! reused unchanged for every block the sniper targets. Signing it yields a
//! [`SignedTransaction`] carrying the raw EIP-2718 bytes that go into a bundle.

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};

/// The unsigned purchase transaction.
///
/// Fee caps are fixed at construction. A bundle that is not included costs
/// nothing, so retries never escalate fees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
	/// Sale contract receiving the call.
	pub to: Address,
	/// Chain the transaction is valid on.
	pub chain_id: u64,
	/// Account nonce, fixed for the whole run.
	pub nonce: u64,
	/// Encoded mint call.
	pub input: Bytes,
	/// Native currency sent with the call, in wei.
	pub value: U256,
	/// Gas limit for the mint call.
	pub gas_limit: u64,
	/// Max fee per gas in wei (priority fee plus projected base fee).
	pub max_fee_per_gas: u128,
	/// Max priority fee per gas in wei.
	pub max_priority_fee_per_gas: u128,
}

impl PendingTransaction {
	/// Worst-case amount the sender can be charged: value plus the full gas
	/// limit at the max fee.
	pub fn max_cost(&self) -> U256 {
		self.value
			+ U256::from(self.gas_limit).saturating_mul(U256::from(self.max_fee_per_gas))
	}
}

impl From<&PendingTransaction> for TxEip1559 {
	fn from(tx: &PendingTransaction) -> Self {
		TxEip1559 {
			chain_id: tx.chain_id,
			nonce: tx.nonce,
			gas_limit: tx.gas_limit,
			max_fee_per_gas: tx.max_fee_per_gas,
			max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
			to: TxKind::Call(tx.to),
			value: tx.value,
			access_list: Default::default(),
			input: tx.input.clone(),
		}
	}
}

/// A signed transaction ready to be placed in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	/// Transaction hash, used to find the transaction in the target block.
	pub hash: B256,
	/// EIP-2718 encoded envelope.
	pub raw: Bytes,
	/// Sender address.
	pub from: Address,
	/// Nonce the transaction was signed with.
	pub nonce: u64,
}
