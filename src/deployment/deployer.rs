use std::fmt;

use ethers::types::Address;
use ethers::utils::to_checksum;
use tracing::{info, instrument, warn};

use super::error::DeploymentError;
use super::interfaces::{
    ArtifactRegistry, ContractFactory, DeployedContract, PendingDeployment,
    SignerIdentity, SignerProvider,
};
use crate::types::{ContractName, TokenAddress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub contract_name: ContractName,
    pub deployer: Address,
    pub token_address: Address,
    pub contract: DeployedContract,
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deploying with account: {}",
            to_checksum(&self.deployer, None)
        )?;
        write!(
            f,
            "{} deployed to: {}",
            self.contract_name.contract(),
            to_checksum(&self.contract.address, None)
        )
    }
}

pub struct Deployer<P, R> {
    provider: P,
    registry: R,
    contract_name: ContractName,
    token_address: TokenAddress,
}

impl<P, R> Deployer<P, R>
where
    P: SignerProvider,
    R: ArtifactRegistry,
{
    pub fn new(provider: P, registry: R, contract_name: ContractName) -> Self {
        Self {
            provider,
            registry,
            contract_name,
            token_address: TokenAddress::default(),
        }
    }

    pub fn with_token_address(mut self, token_address: TokenAddress) -> Self {
        self.token_address = token_address;
        self
    }

    /// Deploys the contract once.
    ///
    /// Not idempotent, every call creates a new contract instance.
    #[instrument(name = "deploy", skip_all, fields(contract = %self.contract_name))]
    pub async fn run(&self) -> Result<DeploymentOutcome, DeploymentError> {
        let signer = self.acquire_signer().await?;

        info!(
            "Deploying with account: {}",
            to_checksum(&signer.address, None)
        );

        let token_address = self.token_address.resolve(signer.address);
        if self.token_address.is_placeholder() {
            warn!(
                "No token address configured, using the deployer address {} \
                 as a placeholder",
                to_checksum(&token_address, None)
            );
        }

        let factory = self.resolve_factory().await?;

        let pending =
            submit(factory.as_ref(), &signer, token_address).await?;

        let contract = confirm(pending.as_ref()).await?;

        info!(
            "{} deployed to: {}",
            self.contract_name.contract(),
            to_checksum(&contract.address, None)
        );

        Ok(DeploymentOutcome {
            contract_name: self.contract_name.clone(),
            deployer: signer.address,
            token_address,
            contract,
        })
    }

    #[instrument(skip_all)]
    async fn acquire_signer(&self) -> Result<SignerIdentity, DeploymentError> {
        self.provider
            .signers()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DeploymentError::Provider(
                    "no signer available from the provider".to_string(),
                )
            })
    }

    #[instrument(skip_all)]
    async fn resolve_factory(
        &self,
    ) -> Result<Box<dyn ContractFactory>, DeploymentError> {
        self.registry.contract_factory(&self.contract_name).await
    }
}

#[instrument(skip_all, fields(token_address = ?token_address))]
async fn submit(
    factory: &dyn ContractFactory,
    signer: &SignerIdentity,
    token_address: Address,
) -> Result<Box<dyn PendingDeployment>, DeploymentError> {
    let pending = factory.deploy(signer, token_address).await?;

    info!("Submitted transaction {:?}", pending.transaction_hash());

    Ok(pending)
}

#[instrument(skip_all, fields(tx = ?pending.transaction_hash()))]
async fn confirm(
    pending: &dyn PendingDeployment,
) -> Result<DeployedContract, DeploymentError> {
    pending.wait_for_deployment().await
}
