//! Assembles a [`SniperEngine`] from configuration.
//!
//! Concrete chain, relay and account implementations come in through factory
//! functions, so the service binary decides which clients to use and tests can
//! substitute in-memory ones.

use crate::engine::{SaleTarget, SniperEngine};
use crate::SniperError;
use alloy::primitives::U256;
use sniper_account::{AccountError, AccountInterface, AccountService};
use sniper_chain::{ChainError, ChainInterface, ChainService};
use sniper_config::Config;
use sniper_relay::{InclusionResolver, RelayError, RelayInterface, RelayService};
use sniper_types::SecretString;
use std::sync::Arc;
use std::time::Duration;

/// Factory functions for each external client.
pub struct SniperFactories<AF, CF, RF> {
	pub account_factory: AF,
	pub chain_factory: CF,
	pub relay_factory: RF,
}

/// Builder for a [`SniperEngine`].
pub struct SniperBuilder {
	config: Config,
}

impl SniperBuilder {
	/// Creates a new SniperBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates every service and decodes the sale parameters.
	///
	/// The relay request signer reuses the wallet account unless a distinct,
	/// non-empty `relay_signing_key` is configured. Makes no network calls.
	///
	/// # Arguments
	///
	/// * `factories` - Constructors for the account, chain and relay clients
	///
	/// # Returns
	///
	/// A ready-to-run [`SniperEngine`], or [`SniperError::Config`] if the sale
	/// parameters cannot be decoded or a factory fails.
	pub fn build<AF, CF, RF>(
		self,
		factories: SniperFactories<AF, CF, RF>,
	) -> Result<SniperEngine, SniperError>
	where
		AF: Fn(&SecretString) -> Result<Box<dyn AccountInterface>, AccountError>,
		CF: Fn(&str) -> Result<Box<dyn ChainInterface>, ChainError>,
		RF: Fn(
			&str,
			Arc<AccountService>,
			InclusionResolver,
		) -> Result<Box<dyn RelayInterface>, RelayError>,
	{
		let config = self.config;

		let sale = SaleTarget {
			contract: config
				.sale
				.contract()
				.map_err(|e| SniperError::Config(e.to_string()))?,
			input: config
				.sale
				.input()
				.map_err(|e| SniperError::Config(e.to_string()))?,
			value: config
				.sale
				.value_wei()
				.map_err(|e| SniperError::Config(e.to_string()))?,
			gas_limit: config.sale.gas_limit,
			sellout_supply: U256::from(config.sale.sellout_supply),
		};

		let account = Arc::new(AccountService::new(
			(factories.account_factory)(&config.account.private_key).map_err(|e| {
				tracing::error!(component = "account", error = %e, "Failed to create account");
				SniperError::Config(format!("Failed to create account: {}", e))
			})?,
		));
		tracing::info!(component = "account", address = %account.address(), "Loaded");

		let relay_key = config.account.relay_key();
		let relay_signer = if relay_key == &config.account.private_key {
			account.clone()
		} else {
			Arc::new(AccountService::new((factories.account_factory)(relay_key).map_err(
				|e| SniperError::Config(format!("Failed to create relay signing account: {}", e)),
			)?))
		};
		tracing::info!(component = "relay_signer", address = %relay_signer.address(), "Loaded");

		let chain = Arc::new(ChainService::new(
			(factories.chain_factory)(&config.network.rpc_url).map_err(|e| {
				tracing::error!(component = "chain", error = %e, "Failed to create chain client");
				SniperError::Config(format!("Failed to create chain client: {}", e))
			})?,
			Duration::from_secs(config.sniper.rpc_retry_max_elapsed_seconds),
		));
		tracing::info!(component = "chain", chain_id = config.network.chain_id, "Loaded");

		let resolver = InclusionResolver::new(
			chain.clone(),
			Duration::from_millis(config.network.block_poll_interval_ms),
		);
		let relay = Arc::new(RelayService::new(
			(factories.relay_factory)(&config.relay.url, relay_signer, resolver).map_err(|e| {
				tracing::error!(component = "relay", error = %e, "Failed to create relay client");
				SniperError::Config(format!("Failed to create relay client: {}", e))
			})?,
			Duration::from_secs(config.relay.inclusion_timeout_seconds),
		));
		tracing::info!(component = "relay", url = %config.relay.url, "Loaded");

		Ok(SniperEngine::new(config, sale, account, chain, relay))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::tests::{config, engine, FakeChain, FakeRelay};
	use sniper_account::implementations::local::create_account;

	#[test]
	fn test_build_decodes_sale() {
		let engine = engine(config(true, ""), &FakeChain::default(), &FakeRelay::default());
		assert_eq!(engine.config().sale.sellout_supply, 19_995);
	}

	/// Runs the builder with `config`, returning the relay signer's address and
	/// how many accounts were created.
	fn build_relay_signer(config: Config) -> (alloy::primitives::Address, usize) {
		let accounts = Arc::new(std::sync::atomic::AtomicUsize::new(0));
		let relay_addresses = Arc::new(std::sync::Mutex::new(Vec::new()));
		let created = accounts.clone();
		let seen = relay_addresses.clone();

		SniperBuilder::new(config)
			.build(SniperFactories {
				account_factory: move |key: &SecretString| {
					created.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
					create_account(key)
				},
				chain_factory: |_url: &str| {
					Ok(Box::new(FakeChain::default()) as Box<dyn ChainInterface>)
				},
				relay_factory: move |_url: &str,
				                     signer: Arc<AccountService>,
				                     _resolver: InclusionResolver| {
					seen.lock().unwrap().push(signer.address());
					Ok(Box::new(FakeRelay::default()) as Box<dyn RelayInterface>)
				},
			})
			.unwrap();

		let address = relay_addresses.lock().unwrap()[0];
		(address, accounts.load(std::sync::atomic::Ordering::SeqCst))
	}

	#[test]
	fn test_empty_relay_key_falls_back_to_wallet() {
		let wallet: alloy::primitives::Address =
			"0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();

		let mut empty_key = config(true, "");
		empty_key.account.relay_signing_key = Some(SecretString::from(""));
		assert_eq!(build_relay_signer(empty_key), (wallet, 1));

		let mut no_key = config(true, "");
		no_key.account.relay_signing_key = None;
		assert_eq!(build_relay_signer(no_key), (wallet, 1));
	}

	#[test]
	fn test_relay_key_from_unset_env_var() {
		let config: Config = r#"
[network]
chain_id = 1
rpc_url = "http://localhost:8545"

[account]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
relay_signing_key = "${SNIPER_BUILDER_TEST_UNSET_RELAY_KEY:-}"

[sale]
start_timestamp = 1645634753
contract_address = "0xCa7cA7BcC765F77339bE2d648BA53ce9c8a262bD"
call_data = "0xf8b4d9810000000000000000000000000000000000000000000000000000000000000005"
value_eth = "0.5"
"#
		.parse()
		.unwrap();

		let (address, accounts) = build_relay_signer(config);
		assert_eq!(
			address,
			"0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
				.parse::<alloy::primitives::Address>()
				.unwrap()
		);
		assert_eq!(accounts, 1);
	}

	#[test]
	fn test_separate_relay_key() {
		let mut config = config(true, "");
		config.account.relay_signing_key = Some(SecretString::from(
			"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
		));

		let expected: alloy::primitives::Address =
			"0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap();
		assert_eq!(build_relay_signer(config), (expected, 2));
	}

	#[test]
	fn test_factory_failure_is_config_error() {
		let result = SniperBuilder::new(config(true, "")).build(SniperFactories {
			account_factory: create_account,
			chain_factory: |_url: &str| -> Result<Box<dyn ChainInterface>, ChainError> {
				Err(ChainError::Network("Invalid RPC URL".into()))
			},
			relay_factory: |_url: &str, _signer: Arc<AccountService>, _resolver: InclusionResolver| {
				Ok(Box::new(FakeRelay::default()) as Box<dyn RelayInterface>)
			},
		});
		assert!(matches!(result, Err(SniperError::Config(_))));
	}
}
