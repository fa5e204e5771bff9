//! Main entry point for the sniper.
//!
//! Loads the configuration, wires the HTTP chain client, the local signing
//! account and the Flashbots relay into a [`SniperEngine`], runs it once and
//! exits with a code describing how the run ended:
//!
//! - `0`: the purchase was included (or its nonce was consumed by an earlier
//!   attempt)
//! - `2`: the collection sold out first
//! - `1`: the run failed or was interrupted

use clap::Parser;
use sniper_account::implementations::local::create_account;
use sniper_chain::implementations::evm::alloy::create_chain;
use sniper_config::Config;
use sniper_core::{SniperBuilder, SniperEngine, SniperError, SniperFactories};
use sniper_relay::implementations::flashbots::create_relay;
use sniper_types::RunOutcome;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for failed or interrupted runs.
const FAILURE_EXIT_CODE: u8 = 1;

/// Command-line arguments for the sniper.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/sniper.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started sniper");

	let result = run(&args).await;
	let code = exit_code(&result);

	match result {
		Ok(outcome) => tracing::info!(outcome = ?outcome, exit_code = code, "Stopped sniper"),
		Err(e) => tracing::error!(error = %e, exit_code = code, "Sniper failed"),
	}

	ExitCode::from(code)
}

async fn run(args: &Args) -> Result<RunOutcome, Box<dyn std::error::Error>> {
	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		chain_id = config.network.chain_id,
		contract = %config.sale.contract_address,
		start_timestamp = config.sale.start_timestamp,
		"Loaded configuration"
	);

	let sniper = build_sniper(config)?;
	Ok(sniper.run().await?)
}

/// Builds the engine with the production chain, account and relay clients.
fn build_sniper(config: Config) -> Result<SniperEngine, SniperError> {
	SniperBuilder::new(config).build(SniperFactories {
		account_factory: create_account,
		chain_factory: create_chain,
		relay_factory: create_relay,
	})
}

fn exit_code<E>(result: &Result<RunOutcome, E>) -> u8 {
	match result {
		Ok(outcome) => u8::try_from(outcome.exit_code()).unwrap_or(FAILURE_EXIT_CODE),
		Err(_) => FAILURE_EXIT_CODE,
	}
}
