use ethers::types::{Address, TxHash};
use serde::{Deserialize, Serialize};

use crate::deployment::DeployedContract;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ContractDeployment {
    pub address: Address,
    pub transaction_hash: TxHash,

    #[serde(default)]
    pub block_number: Option<u64>,
}

impl From<DeployedContract> for ContractDeployment {
    fn from(value: DeployedContract) -> Self {
        Self {
            address: value.address,
            transaction_hash: value.transaction_hash,
            block_number: value.block_number,
        }
    }
}
