//! Common types module for the multisig co-signer.
//!
//! This module defines the data types shared by the nonce resolver, the message
//! signer and the binary. Addresses, amounts and nonces are kept as their raw
//! on-chain representations so that nothing is ever compared or hashed through a
//! display string.

/// Secure string wrapper for private keys.
pub mod secret_string;
/// Immutable contract-compatible signature value.
pub mod signature;
/// Transfer request and authorization types.
pub mod transfer;
/// Utility functions for parsing and formatting on-chain values.
pub mod utils;

pub use alloy_primitives::{Address, B256, U256};
pub use secret_string::SecretString;
pub use signature::{Signature, SignatureError};
pub use transfer::{TransferAuthorization, TransferRequest};
pub use utils::{
	address_from_slice, parse_address, parse_uint256, uint256_from_be_slice, with_0x_prefix,
	without_0x_prefix, ConversionError, RECOVERY_ID_OFFSET,
};
