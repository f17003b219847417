//! Transfer authorization types.
//!
//! A [`TransferRequest`] carries the caller-supplied parameters of a 2-of-3
//! transfer. A [`TransferAuthorization`] is the complete output of one
//! co-signing run: the nonce and the signature are only ever produced together.

use crate::signature::Signature;
use crate::utils::{parse_address, parse_uint256, ConversionError};
use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

/// Parameters of one multisig transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
	/// The multisig token contract that verifies the signatures.
	pub token: Address,
	/// Recipient of the transfer.
	pub spender: Address,
	/// The multisig account the tokens move from.
	pub multisig: Address,
	/// Token quantity in base units.
	pub amount: U256,
}

impl TransferRequest {
	/// Creates a request from already-parsed values.
	pub fn new(token: Address, spender: Address, multisig: Address, amount: U256) -> Self {
		Self {
			token,
			spender,
			multisig,
			amount,
		}
	}

	/// Parses a request from string inputs.
	///
	/// Addresses go through [`parse_address`] and the amount through
	/// [`parse_uint256`], so malformed addresses and amounts wider than 256 bits
	/// are rejected here.
	pub fn parse(
		token: &str,
		spender: &str,
		multisig: &str,
		amount: &str,
	) -> Result<Self, ConversionError> {
		Ok(Self {
			token: parse_address(token)?,
			spender: parse_address(spender)?,
			multisig: parse_address(multisig)?,
			amount: parse_uint256(amount)?,
		})
	}
}

/// A nonce together with the co-signer's signature over the transfer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferAuthorization {
	/// The nonce the signature commits to.
	pub nonce: U256,
	/// The co-signer's signature in the verifier's encoding.
	pub signature: Signature,
	/// Keccak-256 hash of the packed transfer message.
	pub message_hash: B256,
	/// Address of the key that produced the signature.
	pub signer: Address,
}

impl TransferAuthorization {
	/// Returns `(nonce, (r, s, v))` as expected by the transfer entry point.
	pub fn calldata(&self) -> (U256, (B256, B256, u8)) {
		(self.nonce, self.signature.encoded())
	}
}
