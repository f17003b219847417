//! Protocol constants shared with the on-chain verifier.

/// Offset added to the raw ECDSA recovery id to form `v`.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// Length of the packed transfer message: three addresses and two 32-byte words.
pub const MESSAGE_LENGTH: usize = 20 * 3 + 32 * 2;
