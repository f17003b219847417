//! Entry point for the multisig co-signer.
//!
//! Loads the configuration, wires the nonce reader and the signing key, and
//! runs one command. Results are printed to stdout as JSON; logs go to stderr.

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use cosigner_config::Config;
use cosigner_core::{CoSigner, CoSignerError};
use cosigner_types::{parse_address, parse_uint256};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line arguments for the co-signer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", global = true)]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show the stored and next nonce of a multisig account
	Nonce {
		#[arg(long)]
		multisig: String,
	},
	/// Sign a transfer from a multisig account
	Sign {
		#[arg(long)]
		multisig: String,
		#[arg(long)]
		spender: String,
		/// Amount in base units, decimal or 0x-hex
		#[arg(long)]
		amount: String,
		/// Sign at this nonce instead of reading it from the contract
		#[arg(long)]
		nonce: Option<String>,
	},
	/// Print the address of the configured signing key
	Address,
}

#[derive(Debug, Serialize)]
struct NonceReport {
	multisig: Address,
	current: U256,
	next: U256,
}

#[derive(Debug, Serialize)]
struct AddressReport {
	signer: Address,
	contract: Address,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::debug!(
		config = %args.config.display(),
		contract = %config.contract.token,
		chain_id = ?config.network.chain_id,
		"Loaded configuration"
	);

	let cosigner = CoSigner::from_config(&config)?;

	let output = run(&cosigner, args.command).await.inspect_err(|e| {
		tracing::warn!(error = %e, "Command failed");
	})?;
	println!("{}", output);

	Ok(())
}

/// Executes `command` and returns its JSON output.
async fn run(cosigner: &CoSigner, command: Command) -> Result<String, Box<dyn std::error::Error>> {
	let output = match command {
		Command::Nonce { multisig } => {
			let multisig = parse_address(&multisig).map_err(CoSignerError::from)?;
			let next = cosigner.resolve_nonce(multisig).await?;
			serde_json::to_string_pretty(&NonceReport {
				multisig,
				current: next - U256::from(1),
				next,
			})?
		},
		Command::Sign {
			multisig,
			spender,
			amount,
			nonce: None,
		} => {
			let authorization = cosigner.authorize_str(&multisig, &spender, &amount).await?;
			serde_json::to_string_pretty(&authorization)?
		},
		Command::Sign {
			multisig,
			spender,
			amount,
			nonce: Some(nonce),
		} => {
			let multisig = parse_address(&multisig).map_err(CoSignerError::from)?;
			let spender = parse_address(&spender).map_err(CoSignerError::from)?;
			let amount = parse_uint256(&amount).map_err(CoSignerError::from)?;
			let nonce = parse_uint256(&nonce).map_err(CoSignerError::from)?;
			let authorization = cosigner.authorize_with_nonce(multisig, spender, amount, nonce)?;
			serde_json::to_string_pretty(&authorization)?
		},
		Command::Address => serde_json::to_string_pretty(&AddressReport {
			signer: cosigner.signer_address(),
			contract: cosigner.contract(),
		})?,
	};

	Ok(output)
}
