//! Message signing module for the multisig co-signer.
//!
//! This module turns a transfer request and a resolved nonce into the
//! signature the multisig token contract verifies: the packed message is
//! hashed with Keccak-256, signed with secp256k1 ECDSA and returned as
//! `(r, s, v)` with `v = recovery_id + 27`.
//!
//! Signing is deterministic. Nonces come from RFC 6979 and `s` is normalized
//! to the lower half of the curve order, so the same key and hash always give
//! the same signature.

use alloy_primitives::{Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use cosigner_types::{without_0x_prefix, SecretString, Signature, TransferRequest};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod message;
pub mod recovery;

pub use message::{encode_transfer_message, transfer_message_hash};
pub use recovery::recover_signer;

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SignerError {
	/// The private key is malformed or outside the valid scalar range.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The signing primitive failed.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Public-key recovery from a signature failed.
	#[error("Recovery failed: {0}")]
	RecoveryFailed(String),
}

/// Signs transfer messages with a single secp256k1 key.
pub struct MessageSigner {
	signer: PrivateKeySigner,
}

impl MessageSigner {
	/// Builds a signer from a hex-encoded private key, with or without `0x`.
	///
	/// The decoded scalar is wiped on return. Error messages never include key
	/// material.
	pub fn from_secret(key: &SecretString) -> Result<Self, SignerError> {
		key.with_exposed(|raw| {
			let digits = without_0x_prefix(raw.trim());
			if digits.len() != 64 {
				return Err(SignerError::InvalidKey(format!(
					"expected 64 hex characters, got {}",
					digits.len()
				)));
			}
			let mut bytes = Zeroizing::new([0u8; 32]);
			hex::decode_to_slice(digits, bytes.as_mut_slice())
				.map_err(|_| SignerError::InvalidKey("key is not valid hex".into()))?;
			Self::from_scalar(bytes.as_slice())
		})
	}

	/// Builds a signer from a raw 32-byte scalar.
	///
	/// Fails for zero and for values not below the secp256k1 group order.
	pub fn from_bytes(key: &B256) -> Result<Self, SignerError> {
		Self::from_scalar(key.as_slice())
	}

	fn from_scalar(key: &[u8]) -> Result<Self, SignerError> {
		PrivateKeySigner::from_slice(key)
			.map(|signer| Self { signer })
			.map_err(|_| {
				SignerError::InvalidKey("scalar is zero or not below the secp256k1 order".into())
			})
	}

	/// Address derived from the signing key.
	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Signs a 32-byte message hash.
	pub fn sign_hash(&self, hash: &B256) -> Result<Signature, SignerError> {
		let (ecdsa, recovery_id) = self
			.signer
			.credential()
			.sign_prehash_recoverable(hash.as_slice())
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;

		let rs = ecdsa.to_bytes();
		Signature::from_recovery_id(
			B256::from_slice(&rs[..32]),
			B256::from_slice(&rs[32..]),
			recovery_id.to_byte(),
		)
		.map_err(|e| SignerError::SigningFailed(e.to_string()))
	}

	/// Signs the canonical message for `request` at `nonce`.
	///
	/// Returns the message hash alongside the signature.
	pub fn sign_transfer(
		&self,
		request: &TransferRequest,
		nonce: U256,
	) -> Result<(B256, Signature), SignerError> {
		let hash = transfer_message_hash(request, nonce);
		let signature = self.sign_hash(&hash)?;

		tracing::debug!(
			signer = %self.address(),
			message_hash = %hash,
			nonce = %nonce,
			v = signature.v(),
			"Signed transfer message"
		);

		Ok((hash, signature))
	}
}

impl fmt::Debug for MessageSigner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MessageSigner")
			.field("address", &self.address())
			.finish_non_exhaustive()
	}
}
