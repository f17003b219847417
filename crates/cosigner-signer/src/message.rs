//! Canonical transfer message encoding.
//!
//! The verifier rebuilds the message as
//! `keccak256(abi.encodePacked(token, spender, multisig, amount, nonce))`.
//! Addresses are packed at their natural 20-byte width and integers as 32-byte
//! big-endian words. Field order and widths must match the contract exactly;
//! a mismatch yields a signature that simply fails to verify on-chain.

use alloy_primitives::{keccak256, Address, B256, U256};
use cosigner_types::{utils::MESSAGE_LENGTH, TransferRequest};

/// Minimal `abi.encodePacked` encoder for the static types in the message.
pub struct PackedEncoder {
	buf: Vec<u8>,
}

impl Default for PackedEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl PackedEncoder {
	pub fn new() -> Self {
		Self {
			buf: Vec::with_capacity(MESSAGE_LENGTH),
		}
	}

	/// Appends an address as its 20 raw bytes, without padding.
	pub fn push_address(&mut self, addr: &Address) -> &mut Self {
		self.buf.extend_from_slice(addr.as_slice());
		self
	}

	/// Appends a `uint256` as a 32-byte big-endian word.
	pub fn push_u256(&mut self, v: U256) -> &mut Self {
		self.buf.extend_from_slice(&v.to_be_bytes::<32>());
		self
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}

/// Packs `token ‖ spender ‖ multisig ‖ amount ‖ nonce`.
pub fn encode_transfer_message(request: &TransferRequest, nonce: U256) -> Vec<u8> {
	let mut enc = PackedEncoder::new();
	enc.push_address(&request.token)
		.push_address(&request.spender)
		.push_address(&request.multisig)
		.push_u256(request.amount)
		.push_u256(nonce);
	enc.finish()
}

/// Keccak-256 of the packed transfer message.
pub fn transfer_message_hash(request: &TransferRequest, nonce: U256) -> B256 {
	keccak256(encode_transfer_message(request, nonce))
}
