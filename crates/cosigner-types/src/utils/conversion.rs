//! Conversion utilities for addresses and 256-bit integers.
//!
//! Every function here either produces a value of the exact on-chain width or
//! fails. Nothing is padded past its field width and nothing is truncated.

use super::formatting::{with_0x_prefix, without_0x_prefix};
use alloy_primitives::{Address, U256};
use thiserror::Error;

const ADDRESS_LENGTH: usize = 20;

/// Errors raised while converting caller input into on-chain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
	/// The input is not a well-formed 20-byte address.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// The value does not fit in 256 bits.
	#[error("Value exceeds 256 bits: {0}")]
	Overflow(String),
	/// The input is not a number in a supported radix.
	#[error("Invalid number: {0}")]
	InvalidNumber(String),
}

/// Builds an address from raw bytes, requiring exactly 20 of them.
pub fn address_from_slice(bytes: &[u8]) -> Result<Address, ConversionError> {
	if bytes.len() != ADDRESS_LENGTH {
		return Err(ConversionError::InvalidAddress(format!(
			"expected {} bytes, got {}",
			ADDRESS_LENGTH,
			bytes.len()
		)));
	}
	Ok(Address::from_slice(bytes))
}

/// Parses a hex address string.
///
/// Accepts 40 hex digits with or without a `0x` prefix. All-lowercase and
/// all-uppercase inputs are taken as-is; mixed-case inputs must carry a valid
/// EIP-55 checksum, since a bad checksum usually means a mistyped address.
pub fn parse_address(input: &str) -> Result<Address, ConversionError> {
	let digits = without_0x_prefix(input.trim());

	if digits.len() != 2 * ADDRESS_LENGTH || !digits.bytes().all(|b| b.is_ascii_hexdigit())
	{
		return Err(ConversionError::InvalidAddress(format!(
			"'{}' is not 20 bytes of hex",
			input
		)));
	}

	let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
	let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
	if has_lower && has_upper {
		return Address::parse_checksummed(with_0x_prefix(digits), None).map_err(|_| {
			ConversionError::InvalidAddress(format!("'{}' has an invalid EIP-55 checksum", input))
		});
	}

	let bytes = hex::decode(digits)
		.map_err(|e| ConversionError::InvalidAddress(format!("'{}': {}", input, e)))?;
	address_from_slice(&bytes)
}

/// Parses an unsigned 256-bit integer from decimal or `0x`-prefixed hex.
///
/// Values wider than 256 bits are rejected with [`ConversionError::Overflow`].
pub fn parse_uint256(input: &str) -> Result<U256, ConversionError> {
	let trimmed = input.trim();
	let (digits, radix) = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex_digits) => (hex_digits, 16u32),
		None => (trimmed, 10u32),
	};

	if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
		return Err(ConversionError::InvalidNumber(input.to_string()));
	}

	// Digits are already validated, so the only remaining failure is width.
	U256::from_str_radix(digits, radix as u64)
		.map_err(|_| ConversionError::Overflow(input.to_string()))
}

/// Interprets big-endian bytes of any length as a 256-bit integer.
///
/// Leading zero bytes are ignored; any significant byte beyond the 32nd is an
/// overflow.
pub fn uint256_from_be_slice(bytes: &[u8]) -> Result<U256, ConversionError> {
	let first_significant = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
	let significant = &bytes[first_significant..];

	U256::try_from_be_slice(significant).ok_or_else(|| {
		ConversionError::Overflow(format!("{} significant bytes", significant.len()))
	})
}
