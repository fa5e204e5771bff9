//! Flashbots relay client.
//!
//! Bundles go out as JSON-RPC `eth_sendBundle` calls. Every request carries an
//! `X-Flashbots-Signature` header of the form `<address>:<signature>`, where
//! the signature is an EIP-191 personal signature over the hex-encoded
//! keccak256 of the request body. The signing key only identifies the searcher
//! to the relay; it does not need to hold funds.

use crate::{InclusionResolver, RelayError, RelayInterface};
use alloy::primitives::keccak256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sniper_account::AccountService;
use sniper_types::{
	truncate_id, with_0x_prefix, BundleSimulation, BundleSubmission, SignedTransaction,
	SubmissionOutcome,
};
use std::sync::Arc;
use std::time::Duration;

/// Header the relay authenticates requests with.
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<P> {
	jsonrpc: &'static str,
	id: u64,
	method: &'static str,
	params: [P; 1],
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
	result: Option<R>,
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	#[serde(default)]
	code: i64,
	message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendBundleParams {
	txs: Vec<String>,
	block_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendBundleResult {
	bundle_hash: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallBundleParams {
	txs: Vec<String>,
	block_number: String,
	state_block_number: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallBundleResult {
	#[serde(default)]
	results: Vec<CallBundleTxResult>,
	#[serde(default)]
	total_gas_used: u64,
}

#[derive(Debug, Deserialize)]
struct CallBundleTxResult {
	error: Option<String>,
	revert: Option<String>,
}

/// Relay client for Flashbots-compatible endpoints.
pub struct FlashbotsRelay {
	client: reqwest::Client,
	url: String,
	signer: Arc<AccountService>,
	resolver: InclusionResolver,
}

impl FlashbotsRelay {
	/// Creates a client for the relay at `url`, authenticating with `signer`.
	pub fn new(
		url: &str,
		signer: Arc<AccountService>,
		resolver: InclusionResolver,
	) -> Result<Self, RelayError> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| RelayError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: url.to_string(),
			signer,
			resolver,
		})
	}

	/// Value of the signature header for `body`.
	async fn signature_header(&self, body: &[u8]) -> Result<String, RelayError> {
		let digest = with_0x_prefix(&hex::encode(keccak256(body)));
		let signature = self.signer.sign_message(digest.as_bytes()).await?;
		Ok(format!(
			"{}:{}",
			self.signer.address(),
			with_0x_prefix(&hex::encode(signature.as_bytes()))
		))
	}

	/// Sends a signed JSON-RPC call and returns its `result`.
	async fn call<P, R>(&self, method: &'static str, params: P) -> Result<R, RelayError>
	where
		P: Serialize,
		R: for<'de> Deserialize<'de>,
	{
		let body = encode_request(method, params)?;
		let signature = self.signature_header(&body).await?;

		let response = self
			.client
			.post(&self.url)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.header(SIGNATURE_HEADER, signature)
			.body(body)
			.send()
			.await
			.map_err(|e| RelayError::Network(format!("{} failed: {}", method, e)))?;

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| RelayError::Network(format!("Failed to read {} response: {}", method, e)))?;

		if !status.is_success() && serde_json::from_str::<Value>(&text).is_err() {
			return Err(RelayError::Rejected(format!("HTTP {}: {}", status, text)));
		}

		decode_response(&text)
	}
}

/// Serializes a single-parameter JSON-RPC request.
fn encode_request<P: Serialize>(method: &'static str, params: P) -> Result<Vec<u8>, RelayError> {
	serde_json::to_vec(&RpcRequest {
		jsonrpc: "2.0",
		id: 1,
		method,
		params: [params],
	})
	.map_err(|e| RelayError::InvalidResponse(format!("Failed to encode {}: {}", method, e)))
}

/// Extracts `result` from a JSON-RPC response body.
fn decode_response<R: for<'de> Deserialize<'de>>(text: &str) -> Result<R, RelayError> {
	let response: RpcResponse<R> = serde_json::from_str(text)
		.map_err(|e| RelayError::InvalidResponse(format!("{}: {}", e, text)))?;

	if let Some(error) = response.error {
		return Err(RelayError::Rejected(format!(
			"{} (code {})",
			error.message, error.code
		)));
	}

	response
		.result
		.ok_or_else(|| RelayError::InvalidResponse("Response has neither result nor error".into()))
}

fn raw_transactions(transactions: &[SignedTransaction]) -> Vec<String> {
	transactions
		.iter()
		.map(|tx| with_0x_prefix(&hex::encode(&tx.raw)))
		.collect()
}

fn block_tag(block: u64) -> String {
	format!("{:#x}", block)
}

fn into_simulation(result: CallBundleResult) -> BundleSimulation {
	let error = result
		.results
		.into_iter()
		.find_map(|tx| tx.error.or(tx.revert));

	BundleSimulation {
		total_gas_used: result.total_gas_used,
		error,
	}
}

#[async_trait]
impl RelayInterface for FlashbotsRelay {
	async fn send_bundle(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSubmission, RelayError> {
		let params = SendBundleParams {
			txs: raw_transactions(transactions),
			block_number: block_tag(target_block),
		};

		let result: SendBundleResult = self.call("eth_sendBundle", params).await?;

		tracing::debug!(
			target_block,
			bundle_hash = %result.bundle_hash.as_deref().map(truncate_id).unwrap_or_default(),
			"Relay accepted bundle"
		);

		Ok(BundleSubmission {
			bundle_hash: result.bundle_hash,
			target_block,
			transactions: transactions.to_vec(),
		})
	}

	async fn wait_for_inclusion(
		&self,
		submission: &BundleSubmission,
	) -> Result<SubmissionOutcome, RelayError> {
		self.resolver.wait(submission).await
	}

	async fn simulate_bundle(
		&self,
		transactions: &[SignedTransaction],
		target_block: u64,
	) -> Result<BundleSimulation, RelayError> {
		let params = CallBundleParams {
			txs: raw_transactions(transactions),
			block_number: block_tag(target_block),
			state_block_number: "latest",
		};

		let result: CallBundleResult = self.call("eth_callBundle", params).await?;
		Ok(into_simulation(result))
	}
}

/// Creates the Flashbots relay client.
pub fn create_relay(
	url: &str,
	signer: Arc<AccountService>,
	resolver: InclusionResolver,
) -> Result<Box<dyn RelayInterface>, RelayError> {
	Ok(Box::new(FlashbotsRelay::new(url, signer, resolver)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Address, Bytes, Signature, B256, U256};
	use sniper_account::implementations::local::create_account;
	use sniper_chain::{ChainError, ChainInterface, ChainService};
	use sniper_types::{without_0x_prefix, SecretString};

	struct StaticChain;

	#[async_trait]
	impl ChainInterface for StaticChain {
		async fn get_block_number(&self) -> Result<u64, ChainError> {
			Ok(1)
		}

		async fn get_base_fee(&self, _block: u64) -> Result<u128, ChainError> {
			Ok(1)
		}

		async fn get_block_transactions(
			&self,
			_block: u64,
		) -> Result<Option<Vec<B256>>, ChainError> {
			Ok(None)
		}

		async fn get_nonce(&self, _address: Address) -> Result<u64, ChainError> {
			Ok(0)
		}

		async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
			Ok(U256::ZERO)
		}

		async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ChainError> {
			Ok(Bytes::new())
		}
	}

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn signed(raw: &[u8]) -> SignedTransaction {
		SignedTransaction {
			hash: B256::repeat_byte(0x01),
			raw: Bytes::copy_from_slice(raw),
			from: Address::ZERO,
			nonce: 0,
		}
	}

	fn relay() -> FlashbotsRelay {
		let account = create_account(&SecretString::from(ANVIL_KEY)).unwrap();
		let chain = Arc::new(ChainService::new(
			Box::new(StaticChain),
			Duration::from_secs(1),
		));
		FlashbotsRelay::new(
			"https://relay.flashbots.net",
			Arc::new(AccountService::new(account)),
			InclusionResolver::new(chain, Duration::from_secs(1)),
		)
		.unwrap()
	}

	#[test]
	fn test_send_bundle_request_shape() {
		let params = SendBundleParams {
			txs: raw_transactions(&[signed(&[0x02, 0xab])]),
			block_number: block_tag(101),
		};
		let body = encode_request("eth_sendBundle", params).unwrap();
		let json: Value = serde_json::from_slice(&body).unwrap();

		assert_eq!(json["jsonrpc"], "2.0");
		assert_eq!(json["method"], "eth_sendBundle");
		assert_eq!(json["params"][0]["txs"][0], "0x02ab");
		assert_eq!(json["params"][0]["blockNumber"], "0x65");
	}

	#[test]
	fn test_call_bundle_request_shape() {
		let params = CallBundleParams {
			txs: raw_transactions(&[signed(&[0x02])]),
			block_number: block_tag(0x10),
			state_block_number: "latest",
		};
		let body = encode_request("eth_callBundle", params).unwrap();
		let json: Value = serde_json::from_slice(&body).unwrap();

		assert_eq!(json["params"][0]["blockNumber"], "0x10");
		assert_eq!(json["params"][0]["stateBlockNumber"], "latest");
	}

	#[test]
	fn test_decode_bundle_hash() {
		let result: SendBundleResult =
			decode_response(r#"{"jsonrpc":"2.0","id":1,"result":{"bundleHash":"0xdead"}}"#)
				.unwrap();
		assert_eq!(result.bundle_hash.as_deref(), Some("0xdead"));
	}

	#[test]
	fn test_decode_rpc_error_is_rejection() {
		let result: Result<SendBundleResult, _> = decode_response(
			r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"bundle too large"}}"#,
		);
		match result {
			Err(RelayError::Rejected(msg)) => assert!(msg.contains("bundle too large")),
			other => panic!("expected rejection, got {:?}", other),
		}
	}

	#[test]
	fn test_decode_garbage_is_invalid_response() {
		let result: Result<SendBundleResult, _> = decode_response("<html>502</html>");
		assert!(matches!(result, Err(RelayError::InvalidResponse(_))));
	}

	#[test]
	fn test_simulation_reports_first_failure() {
		let result: CallBundleResult = decode_response(
			r#"{"result":{"results":[{"gasUsed":21000},{"gasUsed":50000,"revert":"Sale not started"}],"totalGasUsed":71000}}"#,
		)
		.unwrap();
		let simulation = into_simulation(result);

		assert_eq!(simulation.total_gas_used, 71000);
		assert_eq!(simulation.error.as_deref(), Some("Sale not started"));
	}

	#[tokio::test]
	async fn test_signature_header_recovers_signer() {
		let relay = relay();
		let body = br#"{"jsonrpc":"2.0","id":1,"method":"eth_sendBundle","params":[]}"#;

		let header = relay.signature_header(body).await.unwrap();
		let (address, signature) = header.split_once(':').unwrap();
		assert_eq!(address.parse::<Address>().unwrap(), relay.signer.address());

		let signature_bytes = hex::decode(without_0x_prefix(signature)).unwrap();
		let signature = Signature::try_from(signature_bytes.as_slice()).unwrap();
		let digest = with_0x_prefix(&hex::encode(keccak256(body)));
		let recovered = signature
			.recover_address_from_msg(digest.as_bytes())
			.unwrap();
		assert_eq!(recovered, relay.signer.address());
	}
}
