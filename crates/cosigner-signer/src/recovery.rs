//! Off-chain signer recovery.
//!
//! Recovers the address that produced a [`Signature`] over a message hash,
//! using the same `ecrecover` semantics as the verifier. Lets a co-signer
//! check whose signature it holds before forwarding it.

use crate::SignerError;
use alloy_primitives::{Address, B256};
use cosigner_types::Signature;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

/// Recovers the signer address of `signature` over `hash`.
pub fn recover_signer(hash: &B256, signature: &Signature) -> Result<Address, SignerError> {
	let packed = signature.as_bytes();
	let ecdsa = EcdsaSignature::from_slice(&packed[..64])
		.map_err(|e| SignerError::RecoveryFailed(format!("malformed signature: {}", e)))?;
	let recovery_id = RecoveryId::from_byte(signature.recovery_id()).ok_or_else(|| {
		SignerError::RecoveryFailed(format!("invalid recovery id {}", signature.recovery_id()))
	})?;

	let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &ecdsa, recovery_id)
		.map_err(|e| SignerError::RecoveryFailed(e.to_string()))?;

	Ok(public_key_to_address(&key))
}

/// Last 20 bytes of the Keccak-256 of the uncompressed public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
	let point = key.as_affine().to_encoded_point(false);
	// Skip the 0x04 SEC1 tag
	Address::from_raw_public_key(&point.as_bytes()[1..])
}
