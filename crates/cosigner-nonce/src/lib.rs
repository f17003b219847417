//! Nonce resolution module for the multisig co-signer.
//!
//! The multisig token contract stores a per-account nonce and only accepts a
//! transfer signed over `stored + 1`. This module reads the stored value
//! through a read-only [`NonceReader`] and derives the nonce to sign. Nothing
//! here can write contract state: the reader interface exposes a single view
//! call and the resolver holds no state of its own.
//!
//! The resolved nonce is only valid until another authorized transfer commits.
//! Callers must read, sign and submit in one short sequence and re-resolve if
//! the submission is rejected as stale.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use cosigner_types::parse_address;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while resolving a nonce.
#[derive(Debug, Error)]
pub enum NonceError {
	/// The on-chain read could not be completed.
	#[error("State query failed: {0}")]
	StateQuery(String),
	/// The account address is malformed.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// The stored nonce is already the largest 256-bit value.
	#[error("Nonce overflow: stored nonce {0} has no successor")]
	Overflow(U256),
}

/// Read-only access to the multisig token contract's nonce storage.
///
/// Implementations must not send transactions or otherwise change state;
/// `get_nonce` is expected to be safe to call any number of times.
#[async_trait]
pub trait NonceReader: Send + Sync {
	/// Address of the contract this reader is bound to.
	fn contract(&self) -> Address;

	/// Returns the nonce currently stored for `account`.
	async fn get_nonce(&self, account: Address) -> Result<U256, NonceError>;
}

/// Returns the nonce that follows `current`.
pub fn next_nonce(current: U256) -> Result<U256, NonceError> {
	current
		.checked_add(U256::from(1))
		.ok_or(NonceError::Overflow(current))
}

/// Service that derives the next nonce to authorize.
#[derive(Clone)]
pub struct NonceResolver {
	reader: Arc<dyn NonceReader>,
}

impl NonceResolver {
	pub fn new(reader: Arc<dyn NonceReader>) -> Self {
		Self { reader }
	}

	/// Address of the contract the underlying reader queries.
	pub fn contract(&self) -> Address {
		self.reader.contract()
	}

	/// Reads the stored nonce for `multisig` once and returns its successor.
	pub async fn resolve(&self, multisig: Address) -> Result<U256, NonceError> {
		let current = self.reader.get_nonce(multisig).await?;
		let next = next_nonce(current)?;

		tracing::debug!(
			contract = %self.reader.contract(),
			account = %multisig,
			current = %current,
			next = %next,
			"Resolved nonce"
		);

		Ok(next)
	}

	/// Same as [`resolve`](Self::resolve) for a hex address string.
	pub async fn resolve_str(&self, multisig: &str) -> Result<U256, NonceError> {
		let account =
			parse_address(multisig).map_err(|e| NonceError::InvalidAddress(e.to_string()))?;
		self.resolve(account).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// In-memory stand-in for the token contract that records every read and
	/// every state-changing call made against it.
	struct RecordingContract {
		address: Address,
		nonces: Mutex<HashMap<Address, U256>>,
		reads: AtomicUsize,
		writes: AtomicUsize,
		unavailable: bool,
	}

	impl RecordingContract {
		fn new(nonces: &[(Address, U256)]) -> Self {
			Self {
				address: Address::repeat_byte(0xaa),
				nonces: Mutex::new(nonces.iter().copied().collect()),
				reads: AtomicUsize::new(0),
				writes: AtomicUsize::new(0),
				unavailable: false,
			}
		}

		fn unavailable() -> Self {
			Self {
				unavailable: true,
				..Self::new(&[])
			}
		}

		/// Mirrors the contract's transfer execution, which bumps the nonce.
		fn commit_transfer(&self, account: Address) {
			self.writes.fetch_add(1, Ordering::SeqCst);
			let mut nonces = self.nonces.lock().unwrap();
			let entry = nonces.entry(account).or_insert(U256::ZERO);
			*entry += U256::from(1);
		}
	}

	#[async_trait]
	impl NonceReader for RecordingContract {
		fn contract(&self) -> Address {
			self.address
		}

		async fn get_nonce(&self, account: Address) -> Result<U256, NonceError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			if self.unavailable {
				return Err(NonceError::StateQuery("connection refused".into()));
			}
			Ok(self
				.nonces
				.lock()
				.unwrap()
				.get(&account)
				.copied()
				.unwrap_or(U256::ZERO))
		}
	}

	fn multisig() -> Address {
		Address::repeat_byte(0x14)
	}

	#[tokio::test]
	async fn test_resolves_current_plus_one() {
		let contract = Arc::new(RecordingContract::new(&[(multisig(), U256::from(41))]));
		let resolver = NonceResolver::new(contract.clone());

		assert_eq!(resolver.resolve(multisig()).await.unwrap(), U256::from(42));
		assert_eq!(resolver.contract(), Address::repeat_byte(0xaa));
	}

	#[tokio::test]
	async fn test_fresh_account_resolves_to_one() {
		let contract = Arc::new(RecordingContract::new(&[]));
		let resolver = NonceResolver::new(contract);

		assert_eq!(resolver.resolve(multisig()).await.unwrap(), U256::from(1));
	}

	#[tokio::test]
	async fn test_repeated_resolution_never_writes() {
		let contract = Arc::new(RecordingContract::new(&[(multisig(), U256::from(3))]));
		let resolver = NonceResolver::new(contract.clone());

		for _ in 0..5 {
			assert_eq!(resolver.resolve(multisig()).await.unwrap(), U256::from(4));
		}

		assert_eq!(contract.reads.load(Ordering::SeqCst), 5);
		assert_eq!(contract.writes.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_tracks_committed_transfers() {
		let contract = Arc::new(RecordingContract::new(&[]));
		let resolver = NonceResolver::new(contract.clone());

		assert_eq!(resolver.resolve(multisig()).await.unwrap(), U256::from(1));
		contract.commit_transfer(multisig());
		assert_eq!(resolver.resolve(multisig()).await.unwrap(), U256::from(2));
		// Other accounts are unaffected
		assert_eq!(
			resolver.resolve(Address::repeat_byte(0x15)).await.unwrap(),
			U256::from(1)
		);
	}

	#[tokio::test]
	async fn test_state_query_failure_propagates() {
		let contract = Arc::new(RecordingContract::unavailable());
		let resolver = NonceResolver::new(contract.clone());

		let result = resolver.resolve(multisig()).await;
		assert!(matches!(result, Err(NonceError::StateQuery(_))));
		assert_eq!(contract.reads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_overflow_at_max_nonce() {
		let contract = Arc::new(RecordingContract::new(&[(multisig(), U256::MAX)]));
		let resolver = NonceResolver::new(contract);

		let result = resolver.resolve(multisig()).await;
		assert!(matches!(result, Err(NonceError::Overflow(n)) if n == U256::MAX));
	}

	#[tokio::test]
	async fn test_resolve_str() {
		let contract = Arc::new(RecordingContract::new(&[(multisig(), U256::from(9))]));
		let resolver = NonceResolver::new(contract.clone());

		let next = resolver
			.resolve_str("0x1414141414141414141414141414141414141414")
			.await
			.unwrap();
		assert_eq!(next, U256::from(10));

		let result = resolver.resolve_str("0x1414").await;
		assert!(matches!(result, Err(NonceError::InvalidAddress(_))));
		// Malformed input never reaches the contract
		assert_eq!(contract.reads.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_next_nonce() {
		assert_eq!(next_nonce(U256::ZERO).unwrap(), U256::from(1));
		assert_eq!(next_nonce(U256::from(u64::MAX)).unwrap(), U256::from(u64::MAX as u128 + 1));
		assert!(matches!(next_nonce(U256::MAX), Err(NonceError::Overflow(_))));
	}
}
