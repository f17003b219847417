//! Contract-compatible ECDSA signature.
//!
//! A [`Signature`] is built once from the raw `(r, s, recovery_id)` output of
//! the signing primitive and is never mutated afterwards. The recovery id is
//! shifted by [`RECOVERY_ID_OFFSET`] at construction, so `v()` is always the
//! value the verifier expects.

use crate::utils::{with_0x_prefix, RECOVERY_ID_OFFSET};
use alloy_primitives::B256;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when building a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
	/// The signing primitive produced a recovery id the verifier cannot express.
	#[error("Unsupported recovery id {0}, expected 0 or 1")]
	UnsupportedRecoveryId(u8),
	/// A packed signature carried a `v` outside 27 and 28.
	#[error("Invalid v value {0}, expected 27 or 28")]
	InvalidV(u8),
	/// A packed signature was not 65 bytes long.
	#[error("Invalid signature length: expected 65 bytes, got {0}")]
	InvalidLength(usize),
}

/// An immutable `(r, s, v)` signature in the verifier's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
	r: B256,
	s: B256,
	v: u8,
}

impl Signature {
	/// Builds a signature from raw components and a recovery id in `{0, 1}`.
	pub fn from_recovery_id(r: B256, s: B256, recovery_id: u8) -> Result<Self, SignatureError> {
		if recovery_id > 1 {
			return Err(SignatureError::UnsupportedRecoveryId(recovery_id));
		}
		Ok(Self {
			r,
			s,
			v: recovery_id + RECOVERY_ID_OFFSET,
		})
	}

	/// Parses the packed 65-byte `r || s || v` form.
	///
	/// `v` must already carry the offset; raw recovery ids are rejected so the
	/// offset can never be applied twice.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
		if bytes.len() != 65 {
			return Err(SignatureError::InvalidLength(bytes.len()));
		}
		let v = bytes[64];
		let recovery_id = v
			.checked_sub(RECOVERY_ID_OFFSET)
			.filter(|id| *id <= 1)
			.ok_or(SignatureError::InvalidV(v))?;
		Self::from_recovery_id(
			B256::from_slice(&bytes[..32]),
			B256::from_slice(&bytes[32..64]),
			recovery_id,
		)
	}

	/// The `r` component.
	pub fn r(&self) -> B256 {
		self.r
	}

	/// The `s` component.
	pub fn s(&self) -> B256 {
		self.s
	}

	/// The offset recovery identifier, always 27 or 28.
	pub fn v(&self) -> u8 {
		self.v
	}

	/// The raw recovery id, always 0 or 1.
	pub fn recovery_id(&self) -> u8 {
		self.v - RECOVERY_ID_OFFSET
	}

	/// Returns the `(r, s, v)` tuple passed as calldata to the transfer entry point.
	pub fn encoded(&self) -> (B256, B256, u8) {
		(self.r, self.s, self.v)
	}

	/// Returns the packed 65-byte `r || s || v` form.
	pub fn as_bytes(&self) -> [u8; 65] {
		let mut out = [0u8; 65];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = self.v;
		out
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&with_0x_prefix(&hex::encode(self.as_bytes())))
	}
}
