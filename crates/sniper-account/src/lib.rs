//! Account management for the sniper.
//!
//! An account is the signing identity behind a run. It signs the purchase
//! transaction and, separately, authenticates requests to the bundle relay.
//! The relay identity may be a different key from the wallet paying for the
//! purchase, so the two are held as two [`AccountService`] instances.

use alloy::primitives::{Address, Signature};
use async_trait::async_trait;
use sniper_types::{PendingTransaction, SignedTransaction};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Interface for signing identities.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address controlled by this account.
	fn address(&self) -> Address;

	/// Signs the purchase transaction, producing the raw bytes for a bundle.
	async fn sign_transaction(
		&self,
		tx: &PendingTransaction,
	) -> Result<SignedTransaction, AccountError>;

	/// Signs `message` as an EIP-191 personal message.
	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError>;
}

/// Service wrapping a single account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Address of the managed account.
	pub fn address(&self) -> Address {
		self.implementation.address()
	}

	/// Signs a transaction using the managed account.
	pub async fn sign(&self, tx: &PendingTransaction) -> Result<SignedTransaction, AccountError> {
		self.implementation.sign_transaction(tx).await
	}

	/// Signs an arbitrary message using the managed account.
	pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		self.implementation.sign_message(message).await
	}
}
