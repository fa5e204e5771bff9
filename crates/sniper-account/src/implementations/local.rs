//! Local private-key account.

use crate::{AccountError, AccountInterface};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Signature};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use sniper_types::{PendingTransaction, SecretString, SignedTransaction};

/// Account backed by a private key held in process memory.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex private key, with or without 0x prefix.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			key.trim()
				.parse::<PrivateKeySigner>()
				.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))
		})?;

		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(
		&self,
		tx: &PendingTransaction,
	) -> Result<SignedTransaction, AccountError> {
		let mut unsigned = TxEip1559::from(tx);
		let signature = self
			.signer
			.sign_transaction_sync(&mut unsigned)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let envelope = TxEnvelope::from(unsigned.into_signed(signature));

		Ok(SignedTransaction {
			hash: *envelope.tx_hash(),
			raw: envelope.encoded_2718().into(),
			from: self.signer.address(),
			nonce: tx.nonce,
		})
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		self.signer
			.sign_message(message)
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

/// Creates a local account from a private key.
pub fn create_account(private_key: &SecretString) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(LocalWallet::new(private_key)?))
}
