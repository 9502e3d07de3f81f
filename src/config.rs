use std::path::PathBuf;
use std::time::Duration;

use ethers::types::Address;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::cli::{Args, PrivateKey};
use crate::types::{ContractName, TokenAddress};

pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Optional deployment configuration file.
///
/// Secrets and the RPC endpoint are never read from here, only from the
/// command line or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub contract: Option<ContractName>,
    pub token_address: Option<Address>,
    pub artifacts_dir: Option<PathBuf>,
    pub confirmations: Option<usize>,
    pub legacy: Option<bool>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: Url,
    pub private_key: Option<PrivateKey>,
    pub contract: ContractName,
    pub token_address: TokenAddress,
    pub artifacts_dir: PathBuf,
    pub confirmations: usize,
    pub legacy: bool,
    pub poll_interval: Duration,
    pub report: Option<PathBuf>,
}

impl Settings {
    /// Command line (and environment) values take precedence over the
    /// config file.
    pub fn merge(args: Args, config: Config) -> Self {
        let poll_interval_ms =
            config.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            rpc_url: args.rpc_url,
            private_key: args.private_key,
            contract: args.contract.or(config.contract).unwrap_or_default(),
            token_address: args.token_address.or(config.token_address).into(),
            artifacts_dir: args
                .artifacts_dir
                .or(config.artifacts_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            confirmations: args
                .confirmations
                .or(config.confirmations)
                .unwrap_or(DEFAULT_CONFIRMATIONS),
            legacy: args.legacy || config.legacy.unwrap_or(false),
            poll_interval: Duration::from_millis(poll_interval_ms),
            report: args.report,
        }
    }
}
