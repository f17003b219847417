//! Configuration module for the multisig co-signer.
//!
//! This module loads the co-signer's TOML configuration: the RPC endpoint used
//! for the read-only nonce query, the multisig token contract, and the signing
//! key. `${VAR}` and `${VAR:-default}` placeholders are resolved from the
//! environment before parsing so the key never has to live in the file.

use cosigner_types::{parse_address, Address, SecretString};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the co-signer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// RPC endpoint settings.
	pub network: NetworkConfig,
	/// The multisig token contract.
	pub contract: ContractConfig,
	/// Signing key settings.
	pub signer: SignerConfig,
}

/// RPC endpoint used for the nonce query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP(S) JSON-RPC URL.
	pub rpc_url: String,
	/// Chain ID. Informational only, it is not part of the signed message.
	#[serde(default)]
	pub chain_id: Option<u64>,
}

/// The multisig token contract whose nonces are read and whose address is
/// bound into every signed message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	#[serde(deserialize_with = "deserialize_address")]
	pub token: Address,
}

/// Signing key settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
	/// Hex-encoded secp256k1 private key, usually `"${COSIGNER_PRIVATE_KEY}"`.
	pub private_key: SecretString,
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	parse_address(&raw).map_err(serde::de::Error::custom)
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Validates the configuration.
	///
	/// - RPC URL must be an http or https URL with a host
	/// - Private key must be present
	///
	/// The token address is already checked during deserialization; the private
	/// key's scalar range is checked when the signer is built.
	/// Checks the RPC endpoint and the signing key.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let rpc_url = self.network.rpc_url.trim();
		let url = reqwest::Url::parse(rpc_url).map_err(|e| {
			ConfigError::Validation(format!("network.rpc_url '{}' is invalid: {}", rpc_url, e))
		})?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"network.rpc_url must use http or https, got '{}'",
				url.scheme()
			)));
		}
		if url.host_str().is_none_or(str::is_empty) {
			return Err(ConfigError::Validation(
				"network.rpc_url is missing a host".into(),
			));
		}

		if self.signer.private_key.is_blank() {
			return Err(ConfigError::Validation(
				"signer.private_key cannot be empty".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
