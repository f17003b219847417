//! Alloy-based nonce reader.
//!
//! Reads the stored nonce with an `eth_call` of the contract's `getNonce`
//! view function. The call is executed by the node against the latest state
//! and never produces a transaction.

use crate::{NonceError, NonceReader};
use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use alloy_transport_http::Http;
use async_trait::async_trait;

// View function exposed by the multisig token contract.
sol! {
	/// Returns the last nonce consumed by `account`.
	function getNonce(address account) external view returns (uint256 nonce);
}

/// Nonce reader backed by an HTTP JSON-RPC endpoint.
pub struct AlloyNonceReader {
	/// The Alloy provider for blockchain interaction.
	provider: RootProvider<Http<reqwest::Client>>,
	/// The multisig token contract.
	contract: Address,
}

impl AlloyNonceReader {
	/// Creates a reader for `contract` on the node at `rpc_url`.
	///
	/// No request is made until the first [`NonceReader::get_nonce`] call.
	pub fn new(rpc_url: &str, contract: Address) -> Result<Self, NonceError> {
		let url: reqwest::Url = rpc_url
			.parse()
			.map_err(|e| NonceError::StateQuery(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
			contract,
		})
	}
}

/// Builds the calldata for `getNonce(account)`.
fn encode_get_nonce(account: Address) -> Vec<u8> {
	getNonceCall { account }.abi_encode()
}

/// Decodes the `uint256` returned by `getNonce`.
fn decode_get_nonce(output: &[u8]) -> Result<U256, NonceError> {
	getNonceCall::abi_decode_returns(output, true)
		.map(|ret| ret.nonce)
		.map_err(|e| NonceError::StateQuery(format!("Invalid getNonce response: {}", e)))
}

#[async_trait]
impl NonceReader for AlloyNonceReader {
	fn contract(&self) -> Address {
		self.contract
	}

	async fn get_nonce(&self, account: Address) -> Result<U256, NonceError> {
		let request = TransactionRequest::default()
			.to(self.contract)
			.input(encode_get_nonce(account).into());

		let output = self.provider.call(&request).await.map_err(|e| {
			NonceError::StateQuery(format!(
				"getNonce({}) on {} failed: {}",
				account, self.contract, e
			))
		})?;

		decode_get_nonce(&output)
	}
}
