//! Core sniper workflow.
//!
//! A run waits for the sale to open, prices and signs one purchase
//! transaction, then submits it as a private bundle for the next block. Every
//! new block becomes a retry request; a single worker takes requests in block
//! order, checks the collection's supply and resubmits the same transaction
//! for the following block until it is included or the sale sells out.

use alloy::primitives::U256;
use sniper_account::AccountError;
use sniper_chain::ChainError;
use sniper_relay::RelayError;
use thiserror::Error;

pub mod builder;
pub mod engine;
pub mod fees;
pub mod gate;
pub mod submitter;

pub use builder::{SniperBuilder, SniperFactories};
pub use engine::SniperEngine;
pub use fees::{FeeCalculator, Fees};
pub use submitter::BundleSubmitter;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum SniperError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),
	#[error("Relay error: {0}")]
	Relay(#[from] RelayError),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	/// The wallet cannot pay for the purchase at the computed fee caps.
	#[error("Insufficient funds: balance {balance} wei, need {required} wei")]
	InsufficientFunds { balance: U256, required: U256 },
	/// Shutdown was requested before the run reached an outcome.
	#[error("Interrupted")]
	Interrupted,
	#[error("Service error: {0}")]
	Service(String),
}
