use std::path::PathBuf;

use clap::Parser;
use ethers::types::Address;
use reqwest::Url;

pub mod private_key;

pub use private_key::PrivateKey;

use crate::types::ContractName;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case", version, about)]
pub struct Args {
    /// The RPC Url to use for the deployment
    #[clap(short, long, env, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// Private key to sign the deployment with
    ///
    /// If omitted, the first account unlocked on the node is used
    #[clap(short, long, env)]
    pub private_key: Option<PrivateKey>,

    /// Name of the contract to deploy [default: ClearSettle]
    #[clap(long, env)]
    pub contract: Option<ContractName>,

    /// Address of the token contract passed to the constructor
    ///
    /// If omitted, the deployer's own address is used as a placeholder.
    /// Only suitable for local networks.
    #[clap(short, long, env, value_parser = parse_address)]
    pub token_address: Option<Address>,

    /// Directory containing the compiled build artifacts [default: artifacts]
    #[clap(short, long, env)]
    pub artifacts_dir: Option<PathBuf>,

    /// Number of confirmations to wait for [default: 1]
    #[clap(long, env)]
    pub confirmations: Option<usize>,

    /// Send a legacy transaction instead of an EIP-1559 one
    #[clap(long, env)]
    pub legacy: bool,

    /// Path to an optional deployment configuration file
    #[clap(short, long, env)]
    pub config: Option<PathBuf>,

    /// Write a deployment report to this path on success
    #[clap(long, env)]
    pub report: Option<PathBuf>,
}

pub fn parse_address(s: &str) -> eyre::Result<Address> {
    let s = s.trim_start_matches("0x");

    let bytes = hex::decode(s)?;

    if bytes.len() != Address::len_bytes() {
        eyre::bail!(
            "expected a {} byte address, got {} bytes",
            Address::len_bytes(),
            bytes.len()
        );
    }

    Ok(Address::from_slice(&bytes))
}
