//! Utility functions for on-chain value conversions.
//!
//! This module provides helpers for turning caller-supplied strings and byte
//! slices into fixed-width on-chain values, rejecting anything that does not
//! fit rather than truncating it.

pub mod constants;
pub mod conversion;
pub mod formatting;

pub use constants::{MESSAGE_LENGTH, RECOVERY_ID_OFFSET};
pub use conversion::{
	address_from_slice, parse_address, parse_uint256, uint256_from_be_slice, ConversionError,
};
pub use formatting::{with_0x_prefix, without_0x_prefix};
