//! The sniper engine.
//!
//! [`SniperEngine::run`] drives one complete run: sale start gate, pricing
//! and signing, the first submission, then one retry per new block until a
//! terminal outcome.

pub mod retry;

use crate::fees::FeeCalculator;
use crate::gate;
use crate::submitter::BundleSubmitter;
use crate::SniperError;
use alloy::primitives::{Address, Bytes, U256};
use retry::{RetryQueue, RetryRequest, RetryTrigger};
use sniper_account::AccountService;
use sniper_chain::watcher::BlockEvent;
use sniper_chain::{BlockWatcher, ChainService};
use sniper_config::Config;
use sniper_relay::RelayService;
use sniper_types::{format_gwei, truncate_id, PendingTransaction, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sale parameters decoded from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTarget {
	pub contract: Address,
	pub input: Bytes,
	pub value: U256,
	pub gas_limit: u64,
	/// Supply at which the sale counts as sold out.
	pub sellout_supply: U256,
}

/// Runs the purchase workflow against injected chain, relay and account
/// services.
pub struct SniperEngine {
	config: Config,
	sale: SaleTarget,
	account: Arc<AccountService>,
	chain: Arc<ChainService>,
	relay: Arc<RelayService>,
}

impl SniperEngine {
	pub fn new(
		config: Config,
		sale: SaleTarget,
		account: Arc<AccountService>,
		chain: Arc<ChainService>,
		relay: Arc<RelayService>,
	) -> Self {
		Self {
			config,
			sale,
			account,
			chain,
			relay,
		}
	}

	/// Runs until the bundle lands, the sale sells out, an error occurs or
	/// Ctrl+C is pressed.
	///
	/// Waits for the sale start, prices and signs the purchase once, submits
	/// it for the next block, then retries on every new block. Relay
	/// rejections and chain errors end the run immediately.
	///
	/// # Returns
	///
	/// The terminal [`RunOutcome`], or [`SniperError::Interrupted`] on Ctrl+C.
	pub async fn run(&self) -> Result<RunOutcome, SniperError> {
		tokio::select! {
			result = self.execute() => result,
			Ok(()) = tokio::signal::ctrl_c() => {
				tracing::warn!("Shutdown requested before the run finished");
				Err(SniperError::Interrupted)
			}
		}
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	async fn execute(&self) -> Result<RunOutcome, SniperError> {
		gate::wait_until_sale_start(self.config.sale.start_timestamp).await;

		let (latest, submitter) = self.prepare().await?;

		if self.config.relay.simulate_before_submit {
			submitter.simulate(latest + 1).await;
		}

		let (block_tx, mut block_rx) = mpsc::unbounded_channel();
		let mut watcher = BlockWatcher::spawn(
			self.chain.clone(),
			latest,
			Duration::from_millis(self.config.network.block_poll_interval_ms),
			block_tx,
		);

		let result = self.retry_loop(&submitter, latest, &mut block_rx).await;
		watcher.stop().await;

		match &result {
			Ok(outcome) => tracing::info!(outcome = ?outcome, "Run finished"),
			Err(e) => tracing::error!(error = %e, "Run failed"),
		}
		result
	}

	/// Prices, builds and signs the purchase transaction.
	///
	/// Returns the block the fees were based on, which the first submission
	/// targets the successor of.
	async fn prepare(&self) -> Result<(u64, BundleSubmitter), SniperError> {
		let latest = self.chain.get_block_number().await?;
		let base_fee = self.chain.get_base_fee(latest).await?;
		let fees = FeeCalculator::from_config(&self.config.fees).compute(base_fee);

		tracing::info!(
			block = latest,
			base_fee_gwei = %format_gwei(base_fee),
			max_base_fee_gwei = %format_gwei(fees.max_base_fee),
			max_fee_gwei = %format_gwei(fees.max_fee_per_gas),
			priority_fee_gwei = %format_gwei(fees.max_priority_fee_per_gas),
			"Computed fees"
		);

		let sender = self.account.address();
		let nonce = self.chain.get_nonce(sender).await?;

		let transaction = PendingTransaction {
			to: self.sale.contract,
			chain_id: self.config.network.chain_id,
			nonce,
			input: self.sale.input.clone(),
			value: self.sale.value,
			gas_limit: self.sale.gas_limit,
			max_fee_per_gas: fees.max_fee_per_gas,
			max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
		};

		if self.config.sniper.check_balance {
			let balance = self.chain.get_balance(sender).await?;
			let required = transaction.max_cost();
			if balance < required {
				return Err(SniperError::InsufficientFunds { balance, required });
			}
		}

		let signed = self.account.sign(&transaction).await?;
		tracing::info!(
			from = %sender,
			nonce,
			tx_hash = %truncate_id(&signed.hash.to_string()),
			"Signed purchase transaction"
		);

		Ok((latest, BundleSubmitter::new(self.relay.clone(), signed)))
	}

	/// Worker: takes retry requests in order until one yields an outcome.
	async fn retry_loop(
		&self,
		submitter: &BundleSubmitter,
		latest: u64,
		block_rx: &mut mpsc::UnboundedReceiver<BlockEvent>,
	) -> Result<RunOutcome, SniperError> {
		let mut queue = RetryQueue::new(self.config.sniper.supersede_stale_blocks);
		queue.push(RetryRequest::initial(latest));

		loop {
			while let Ok(event) = block_rx.try_recv() {
				queue.push(RetryRequest::new_block(event?));
			}

			let request = match queue.next() {
				Some(request) => request,
				None => match block_rx.recv().await {
					Some(event) => RetryRequest::new_block(event?),
					None => return Err(SniperError::Service("Block watcher stopped".into())),
				},
			};

			if let Some(outcome) = self.handle_request(submitter, request).await? {
				return Ok(outcome);
			}
		}
	}

	async fn handle_request(
		&self,
		submitter: &BundleSubmitter,
		request: RetryRequest,
	) -> Result<Option<RunOutcome>, SniperError> {
		if request.trigger == RetryTrigger::NewBlock {
			let supply = self.chain.total_supply(self.sale.contract).await?;
			tracing::info!(block = request.observed_block, supply = %supply, "New block");

			if supply >= self.sale.sellout_supply {
				tracing::warn!(
					supply = %supply,
					sellout_supply = %self.sale.sellout_supply,
					"Collection sold out"
				);
				return Ok(Some(RunOutcome::SoldOut { supply }));
			}
		}

		let target_block = request.target_block();
		let outcome = submitter.submit(target_block).await?;
		Ok(RunOutcome::from_submission(outcome, target_block))
	}
}
