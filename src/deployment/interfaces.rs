//! Seams between the deployer and the outside world.
//!
//! The deployer only talks to these traits, the ethers backed
//! implementations live in [`crate::network`].

use async_trait::async_trait;
use ethers::types::{Address, TxHash};

use super::error::DeploymentError;
use crate::types::ContractName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerIdentity {
    pub address: Address,
}

/// A contract instance whose deployment has been confirmed on chain.
///
/// Only obtainable from [`PendingDeployment::wait_for_deployment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait SignerProvider: Send + Sync {
    async fn signers(&self) -> Result<Vec<SignerIdentity>, DeploymentError>;
}

#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Fails with [`DeploymentError::ArtifactNotFound`] for unknown names.
    async fn contract_factory(
        &self,
        name: &ContractName,
    ) -> Result<Box<dyn ContractFactory>, DeploymentError>;
}

#[async_trait]
pub trait ContractFactory: Send + Sync {
    /// Returns once the transaction was accepted by the network, not once
    /// it was mined.
    async fn deploy(
        &self,
        deployer: &SignerIdentity,
        token_address: Address,
    ) -> Result<Box<dyn PendingDeployment>, DeploymentError>;
}

#[async_trait]
pub trait PendingDeployment: Send + Sync {
    fn transaction_hash(&self) -> TxHash;

    async fn wait_for_deployment(
        &self,
    ) -> Result<DeployedContract, DeploymentError>;
}
