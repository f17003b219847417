//! Core co-signing engine.
//!
//! [`CoSigner`] composes the nonce resolver and the message signer into the
//! single operation the second signer of a 2-of-3 transfer performs: read the
//! multisig account's nonce, sign the transfer at `nonce + 1`, and hand back
//! both values together.
//!
//! The token address bound into the message is always the contract the nonce
//! was read from, so a signature can never pair one contract's nonce with
//! another contract's message.

use alloy_primitives::{Address, U256};
use cosigner_config::{Config, ConfigError};
use cosigner_nonce::{
	implementations::evm::alloy::AlloyNonceReader, NonceError, NonceReader, NonceResolver,
};
use cosigner_signer::{MessageSigner, SignerError};
use cosigner_types::{
	parse_address, parse_uint256, ConversionError, TransferAuthorization, TransferRequest,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the co-signer.
///
/// None of these are retried internally; whether a fresh nonce read is safe
/// is for the caller to decide.
#[derive(Debug, Error)]
pub enum CoSignerError {
	/// A malformed address was supplied.
	#[error("Address error: {0}")]
	Address(String),
	/// The on-chain nonce read failed.
	#[error("State query error: {0}")]
	StateQuery(String),
	/// The private key is malformed or out of range.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The signing primitive failed.
	#[error("Signing error: {0}")]
	Signing(String),
	/// An amount or nonce does not fit in 256 bits.
	#[error("Overflow: {0}")]
	Overflow(String),
	/// A numeric input could not be parsed.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// The configuration is unusable.
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
}

impl From<ConversionError> for CoSignerError {
	fn from(err: ConversionError) -> Self {
		match err {
			ConversionError::InvalidAddress(msg) => CoSignerError::Address(msg),
			ConversionError::Overflow(msg) => CoSignerError::Overflow(msg),
			ConversionError::InvalidNumber(msg) => CoSignerError::InvalidInput(msg),
		}
	}
}

impl From<NonceError> for CoSignerError {
	fn from(err: NonceError) -> Self {
		match err {
			NonceError::StateQuery(msg) => CoSignerError::StateQuery(msg),
			NonceError::InvalidAddress(msg) => CoSignerError::Address(msg),
			NonceError::Overflow(current) => {
				CoSignerError::Overflow(format!("stored nonce {} has no successor", current))
			},
		}
	}
}

impl From<SignerError> for CoSignerError {
	fn from(err: SignerError) -> Self {
		match err {
			SignerError::InvalidKey(msg) => CoSignerError::InvalidKey(msg),
			SignerError::SigningFailed(msg) | SignerError::RecoveryFailed(msg) => {
				CoSignerError::Signing(msg)
			},
		}
	}
}

/// Second-signer engine for multisig token transfers.
pub struct CoSigner {
	resolver: NonceResolver,
	signer: MessageSigner,
}

impl CoSigner {
	/// Creates a co-signer reading nonces through `reader` and signing with `signer`.
	pub fn new(reader: Arc<dyn NonceReader>, signer: MessageSigner) -> Self {
		Self {
			resolver: NonceResolver::new(reader),
			signer,
		}
	}

	/// Builds a co-signer from configuration.
	///
	/// Wires an HTTP [`AlloyNonceReader`] for the configured contract and a
	/// signer for the configured key. No network request is made here.
	pub fn from_config(config: &Config) -> Result<Self, CoSignerError> {
		config.validate()?;
		let reader = AlloyNonceReader::new(&config.network.rpc_url, config.contract.token)?;
		let signer = MessageSigner::from_secret(&config.signer.private_key)?;
		Ok(Self::new(Arc::new(reader), signer))
	}

	/// The multisig token contract.
	pub fn contract(&self) -> Address {
		self.resolver.contract()
	}

	/// Address of the signing key.
	pub fn signer_address(&self) -> Address {
		self.signer.address()
	}

	/// Returns the nonce the next transfer from `multisig` must be signed over.
	pub async fn resolve_nonce(&self, multisig: Address) -> Result<U256, CoSignerError> {
		Ok(self.resolver.resolve(multisig).await?)
	}

	/// Resolves the next nonce for `multisig` and signs the transfer.
	pub async fn authorize(
		&self,
		multisig: Address,
		spender: Address,
		amount: U256,
	) -> Result<TransferAuthorization, CoSignerError> {
		let nonce = self.resolve_nonce(multisig).await?;
		self.authorize_with_nonce(multisig, spender, amount, nonce)
	}

	/// Signs the transfer at an explicit nonce without reading chain state.
	///
	/// The nonce must be the stored value plus one or the contract rejects it.
	pub fn authorize_with_nonce(
		&self,
		multisig: Address,
		spender: Address,
		amount: U256,
		nonce: U256,
	) -> Result<TransferAuthorization, CoSignerError> {
		let request = TransferRequest::new(self.contract(), spender, multisig, amount);
		let (message_hash, signature) = self.signer.sign_transfer(&request, nonce)?;

		tracing::info!(
			contract = %request.token,
			multisig = %multisig,
			spender = %spender,
			amount = %amount,
			nonce = %nonce,
			"Authorized transfer"
		);

		Ok(TransferAuthorization {
			nonce,
			signature,
			message_hash,
			signer: self.signer.address(),
		})
	}

	/// String-input variant of [`authorize`](Self::authorize).
	///
	/// All inputs are validated before the nonce is read.
	pub async fn authorize_str(
		&self,
		multisig: &str,
		spender: &str,
		amount: &str,
	) -> Result<TransferAuthorization, CoSignerError> {
		let multisig = parse_address(multisig)?;
		let spender = parse_address(spender)?;
		let amount = parse_uint256(amount)?;
		self.authorize(multisig, spender, amount).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, b256};
	use async_trait::async_trait;
	use cosigner_config::{ContractConfig, NetworkConfig, SignerConfig};
	use cosigner_signer::recover_signer;
	use cosigner_types::SecretString;
	use mockall::predicate::eq;

	mockall::mock! {
		pub Reader {}

		#[async_trait]
		impl NonceReader for Reader {
			fn contract(&self) -> Address;
			async fn get_nonce(&self, account: Address) -> Result<U256, NonceError>;
		}
	}

	const TOKEN: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
	const SPENDER: Address = address!("89F6cdf9056d30669DAC3372E78f186E3C51796D");
	const MULTISIG: Address = address!("14faB4Da20025ddE205C451978c3938fA0a9C5cC");
	const ANVIL_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn one_ether() -> U256 {
		U256::from(1_000_000_000_000_000_000u128)
	}

	fn signer() -> MessageSigner {
		MessageSigner::from_secret(&SecretString::from(ANVIL_KEY_0)).unwrap()
	}

	fn reader_returning(current: U256, reads: usize) -> MockReader {
		let mut reader = MockReader::new();
		reader.expect_contract().return_const(TOKEN);
		reader
			.expect_get_nonce()
			.with(eq(MULTISIG))
			.times(reads)
			.returning(move |_| Ok(current));
		reader
	}

	#[tokio::test]
	async fn test_authorize_reference_vector() {
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::ZERO, 1)), signer());

		let authorization = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await.unwrap();

		assert_eq!(authorization.nonce, U256::from(1));
		assert_eq!(
			authorization.message_hash,
			b256!("977ef4a9c0a4897a5af5c93361639aacde57e5306509a3f0a557e7eea6d825d8")
		);
		let (nonce, (r, s, v)) = authorization.calldata();
		assert_eq!(nonce, U256::from(1));
		assert_eq!(
			r,
			b256!("1f5b1aa7cac069b49256a4cd35fa50ae5b96043770146ff0201aa241e755f823")
		);
		assert_eq!(
			s,
			b256!("0786ca99bf340b357f004cc0f0daf42019e3b101a0059cd38b837f743431f216")
		);
		assert_eq!(v, 27);
		assert_eq!(
			authorization.signer,
			address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
		);
		assert_eq!(
			recover_signer(&authorization.message_hash, &authorization.signature).unwrap(),
			authorization.signer
		);
	}

	#[tokio::test]
	async fn test_authorize_is_repeatable() {
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::from(3), 2)), signer());

		let first = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await.unwrap();
		let second = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await.unwrap();

		assert_eq!(first.nonce, U256::from(4));
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_message_binds_reader_contract() {
		let mut other_reader = MockReader::new();
		other_reader
			.expect_contract()
			.return_const(Address::repeat_byte(0x99));
		other_reader
			.expect_get_nonce()
			.returning(|_| Ok(U256::ZERO));

		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::ZERO, 1)), signer());
		let other = CoSigner::new(Arc::new(other_reader), signer());

		let a = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await.unwrap();
		let b = other.authorize(MULTISIG, SPENDER, one_ether()).await.unwrap();

		assert_eq!(a.nonce, b.nonce);
		assert_ne!(a.message_hash, b.message_hash);
		assert_ne!(a.signature, b.signature);
	}

	#[tokio::test]
	async fn test_state_query_error_returns_nothing() {
		let mut reader = MockReader::new();
		reader.expect_contract().return_const(TOKEN);
		reader
			.expect_get_nonce()
			.times(1)
			.returning(|_| Err(NonceError::StateQuery("node unreachable".into())));

		let cosigner = CoSigner::new(Arc::new(reader), signer());
		let result = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await;

		assert!(
			matches!(result, Err(CoSignerError::StateQuery(msg)) if msg.contains("unreachable"))
		);
	}

	#[tokio::test]
	async fn test_max_stored_nonce_overflows() {
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::MAX, 1)), signer());
		let result = cosigner.authorize(MULTISIG, SPENDER, one_ether()).await;
		assert!(matches!(result, Err(CoSignerError::Overflow(_))));
	}

	#[tokio::test]
	async fn test_authorize_str_validates_before_reading() {
		// Zero reads expected: every call below fails validation.
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::ZERO, 0)), signer());

		let result = cosigner
			.authorize_str(
				"0x14fab4da20025dde205c451978c3938fa0a9c5",
				"0x89F6cdf9056d30669DAC3372E78f186E3C51796D",
				"1",
			)
			.await;
		assert!(matches!(result, Err(CoSignerError::Address(_))));

		let result = cosigner
			.authorize_str(
				"0x14faB4Da20025ddE205C451978c3938fA0a9C5cC",
				"0x89F6cdf9056d30669DAC3372E78f186E3C51796D",
				"115792089237316195423570985008687907853269984665640564039457584007913129639936",
			)
			.await;
		assert!(matches!(result, Err(CoSignerError::Overflow(_))));

		let result = cosigner
			.authorize_str(
				"0x14faB4Da20025ddE205C451978c3938fA0a9C5cC",
				"0x89F6cdf9056d30669DAC3372E78f186E3C51796D",
				"one",
			)
			.await;
		assert!(matches!(result, Err(CoSignerError::InvalidInput(_))));
	}

	#[tokio::test]
	async fn test_authorize_str_success() {
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::ZERO, 1)), signer());

		let authorization = cosigner
			.authorize_str(
				"0x14faB4Da20025ddE205C451978c3938fA0a9C5cC",
				"0x89f6cdf9056d30669dac3372e78f186e3c51796d",
				"1000000000000000000",
			)
			.await
			.unwrap();
		assert_eq!(authorization.signature.v(), 27);
		assert_eq!(authorization.nonce, U256::from(1));
	}

	#[test]
	fn test_authorize_with_nonce_skips_read() {
		let cosigner = CoSigner::new(Arc::new(reader_returning(U256::ZERO, 0)), signer());

		let authorization = cosigner
			.authorize_with_nonce(MULTISIG, SPENDER, one_ether(), U256::from(4))
			.unwrap();
		assert_eq!(authorization.nonce, U256::from(4));
		assert_eq!(authorization.signature.v(), 28);
	}

	#[test]
	fn test_from_config() {
		let config: Config = format!(
			r#"
[network]
rpc_url = "http://127.0.0.1:8545"

[contract]
token = "{}"

[signer]
private_key = "{}"
"#,
			"0x5FbDB2315678afecb367f032d93F642f64180aa3", ANVIL_KEY_0
		)
		.parse()
		.unwrap();

		let cosigner = CoSigner::from_config(&config).unwrap();
		assert_eq!(cosigner.contract(), TOKEN);
		assert_eq!(
			cosigner.signer_address(),
			address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
		);
	}

	#[test]
	fn test_from_config_rejects_bad_key() {
		let config: Config = r#"
[network]
rpc_url = "http://127.0.0.1:8545"

[contract]
token = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[signer]
private_key = "0x0000000000000000000000000000000000000000000000000000000000000000"
"#
		.parse()
		.unwrap();

		let result = CoSigner::from_config(&config);
		assert!(matches!(result, Err(CoSignerError::InvalidKey(_))));
	}

	#[test]
	fn test_from_config_rejects_unparseable_rpc_url() {
		let config = Config {
			network: NetworkConfig {
				rpc_url: "http://[::bad".to_string(),
				chain_id: None,
			},
			contract: ContractConfig { token: TOKEN },
			signer: SignerConfig {
				private_key: SecretString::from(ANVIL_KEY_0),
			},
		};

		let result = CoSigner::from_config(&config);
		assert!(matches!(
			result,
			Err(CoSignerError::Config(ConfigError::Validation(_)))
		));
	}
}
