use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::deployment::DeploymentOutcome;
use crate::types::ContractName;

pub mod contract_deployment;

pub use self::contract_deployment::ContractDeployment;

/// Written after a successful deployment, never read back.
///
/// A second run deploys a fresh contract and overwrites the report.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentReport {
    pub chain_id: u64,
    pub contract_name: ContractName,
    pub deployer: Address,
    pub token_address: Address,

    #[serde(default)]
    pub token_address_is_placeholder: bool,

    pub deployment: ContractDeployment,
}

impl DeploymentReport {
    pub fn new(
        chain_id: u64,
        outcome: &DeploymentOutcome,
        token_address_is_placeholder: bool,
    ) -> Self {
        Self {
            chain_id,
            contract_name: outcome.contract_name.clone(),
            deployer: outcome.deployer,
            token_address: outcome.token_address,
            token_address_is_placeholder,
            deployment: outcome.contract.into(),
        }
    }
}
