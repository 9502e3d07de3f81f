use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::prelude::SignerMiddleware;
use ethers::providers::{
    Http, JsonRpcClient, Middleware, PendingTransaction, Provider,
};
use ethers::signers::{LocalWallet, Signer, Wallet};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, TransactionRequest, TxHash,
};
use tracing::{info, instrument};

use crate::artifacts::{Artifact, ArtifactDir};
use crate::cli::PrivateKey;
use crate::deployment::{
    ArtifactRegistry, ContractFactory, DeployedContract, DeploymentError,
    PendingDeployment, SignerIdentity, SignerProvider,
};
use crate::types::ContractName;

#[derive(Debug, Clone)]
pub enum RpcSigner<P = Http> {
    /// Transactions are signed locally with a private key
    Local(Arc<SignerMiddleware<Provider<P>, LocalWallet>>),
    /// Transactions are signed by the node, e.g. Hardhat or Anvil accounts
    Node,
}

#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    pub legacy: bool,
    pub confirmations: usize,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            legacy: false,
            confirmations: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcNetwork<P = Http> {
    provider: Arc<Provider<P>>,
    signer: RpcSigner<P>,
    chain_id: u64,
    tx_options: TxOptions,
}

impl RpcNetwork<Http> {
    #[instrument(skip(private_key, tx_options))]
    pub async fn connect(
        rpc_url: &str,
        private_key: Option<&PrivateKey>,
        poll_interval: Duration,
        tx_options: TxOptions,
    ) -> Result<Self, DeploymentError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|err| DeploymentError::Provider(err.to_string()))?
            .interval(poll_interval);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|err| DeploymentError::Provider(err.to_string()))?;

        info!("Connected to chain {chain_id}");

        Ok(Self::new(provider, private_key, chain_id.as_u64(), tx_options))
    }
}

impl<P> RpcNetwork<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    pub fn new(
        provider: Provider<P>,
        private_key: Option<&PrivateKey>,
        chain_id: u64,
        tx_options: TxOptions,
    ) -> Self {
        let signer = match private_key {
            Some(private_key) => {
                let wallet = Wallet::from(private_key.key.clone())
                    .with_chain_id(chain_id);

                RpcSigner::Local(Arc::new(SignerMiddleware::new(
                    provider.clone(),
                    wallet,
                )))
            }
            None => RpcSigner::Node,
        };

        Self {
            provider: Arc::new(provider),
            signer,
            chain_id,
            tx_options,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn deployment_transaction(
        &self,
        from: Address,
        data: Bytes,
    ) -> TypedTransaction {
        // No `to`, this is a contract creation
        if self.tx_options.legacy {
            TypedTransaction::Legacy(
                TransactionRequest::new().from(from).data(data),
            )
        } else {
            TypedTransaction::Eip1559(
                Eip1559TransactionRequest::new().from(from).data(data),
            )
        }
    }

    async fn send(&self, tx: TypedTransaction) -> Result<TxHash, DeploymentError> {
        let tx_hash = match &self.signer {
            RpcSigner::Local(middleware) => *middleware
                .send_transaction(tx, None)
                .await
                .map_err(|err| DeploymentError::Submission(err.to_string()))?,
            RpcSigner::Node => *self
                .provider
                .send_transaction(tx, None)
                .await
                .map_err(|err| DeploymentError::Submission(err.to_string()))?,
        };

        Ok(tx_hash)
    }
}

#[async_trait]
impl<P> SignerProvider for RpcNetwork<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    async fn signers(&self) -> Result<Vec<SignerIdentity>, DeploymentError> {
        let addresses = match &self.signer {
            RpcSigner::Local(middleware) => vec![middleware.address()],
            RpcSigner::Node => self
                .provider
                .get_accounts()
                .await
                .map_err(|err| DeploymentError::Provider(err.to_string()))?,
        };

        Ok(addresses
            .into_iter()
            .map(|address| SignerIdentity { address })
            .collect())
    }
}

/// Resolves artifacts from disk and binds them to the network.
#[derive(Debug, Clone)]
pub struct RpcArtifactRegistry<P = Http> {
    artifacts: ArtifactDir,
    network: RpcNetwork<P>,
}

impl<P> RpcArtifactRegistry<P> {
    pub fn new(artifacts: ArtifactDir, network: RpcNetwork<P>) -> Self {
        Self { artifacts, network }
    }
}

#[async_trait]
impl<P> ArtifactRegistry for RpcArtifactRegistry<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    async fn contract_factory(
        &self,
        name: &ContractName,
    ) -> Result<Box<dyn ContractFactory>, DeploymentError> {
        let artifact = self.artifacts.load(name).await?;

        artifact.check_constructor()?;

        Ok(Box::new(RpcContractFactory {
            artifact,
            network: self.network.clone(),
        }))
    }
}

pub struct RpcContractFactory<P = Http> {
    artifact: Artifact,
    network: RpcNetwork<P>,
}

#[async_trait]
impl<P> ContractFactory for RpcContractFactory<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    async fn deploy(
        &self,
        deployer: &SignerIdentity,
        token_address: Address,
    ) -> Result<Box<dyn PendingDeployment>, DeploymentError> {
        let data = self.artifact.deployment_data(token_address)?;

        let tx = self.network.deployment_transaction(deployer.address, data);

        let tx_hash = self.network.send(tx).await?;

        Ok(Box::new(RpcPendingDeployment {
            tx_hash,
            network: self.network.clone(),
        }))
    }
}

pub struct RpcPendingDeployment<P = Http> {
    tx_hash: TxHash,
    network: RpcNetwork<P>,
}

#[async_trait]
impl<P> PendingDeployment for RpcPendingDeployment<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    fn transaction_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn wait_for_deployment(
        &self,
    ) -> Result<DeployedContract, DeploymentError> {
        let receipt =
            PendingTransaction::new(self.tx_hash, self.network.provider.as_ref())
                .confirmations(self.network.tx_options.confirmations)
                .await
                .map_err(|err| DeploymentError::Confirmation(err.to_string()))?
                .ok_or_else(|| {
                    DeploymentError::Confirmation(format!(
                        "transaction {:?} was dropped",
                        self.tx_hash
                    ))
                })?;

        if receipt.status != Some(1.into()) {
            return Err(DeploymentError::Confirmation(format!(
                "transaction {:?} reverted",
                self.tx_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeploymentError::Confirmation(format!(
                "receipt for {:?} has no contract address",
                self.tx_hash
            ))
        })?;

        Ok(DeployedContract {
            address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|number| number.as_u64()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use ethers::types::{
        NameOrAddress, Transaction, TransactionReceipt, H160, H256, U256,
    };
    use hex_literal::hex;

    use super::*;
    use crate::deployment::Deployer;

    // First Hardhat/Anvil development account
    const DEV_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: Address =
        H160(hex!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    const CONTRACT: Address =
        H160(hex!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2"));
    const TX_HASH: TxHash = H256(hex!(
        "cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc"
    ));

    fn network(
        private_key: Option<&PrivateKey>,
        tx_options: TxOptions,
    ) -> RpcNetwork {
        // Nothing is sent, the provider never connects
        let provider = Provider::<Http>::try_from("http://127.0.0.1:8545").unwrap();

        RpcNetwork::new(provider, private_key, 31337, tx_options)
    }

    /// A node-signing network whose responses are queued on the returned
    /// mock. The mock answers the most recently pushed response first.
    fn mocked_network(tx_options: TxOptions) -> (RpcNetwork<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let provider = provider.interval(Duration::from_millis(10));

        (RpcNetwork::new(provider, None, 31337, tx_options), mock)
    }

    fn pending(network: RpcNetwork<MockProvider>) -> RpcPendingDeployment<MockProvider> {
        RpcPendingDeployment {
            tx_hash: TX_HASH,
            network,
        }
    }

    fn mined_transaction() -> Transaction {
        Transaction {
            hash: TX_HASH,
            block_number: Some(1.into()),
            ..Default::default()
        }
    }

    fn receipt(status: u64, contract_address: Option<Address>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: TX_HASH,
            block_number: Some(1.into()),
            status: Some(status.into()),
            contract_address,
            ..Default::default()
        }
    }

    /// Queues a mined transaction followed by its receipt.
    fn push_mined(mock: &MockProvider, receipt: TransactionReceipt) {
        mock.push::<TransactionReceipt, _>(receipt).unwrap();
        mock.push::<Transaction, _>(mined_transaction()).unwrap();
    }

    // Provider errors while polling for the transaction are retried forever
    async fn bounded<F: Future>(fut: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(5), fut)
            .await
            .expect("mock ran out of responses")
    }

    #[tokio::test]
    async fn local_signer_is_the_wallet_address() {
        let key: PrivateKey = DEV_KEY.parse().unwrap();
        let network = network(Some(&key), TxOptions::default());

        let signers = network.signers().await.unwrap();

        assert_eq!(
            signers,
            vec![SignerIdentity {
                address: DEV_ADDRESS
            }]
        );
        assert_eq!(network.chain_id(), 31337);
    }

    #[tokio::test]
    async fn node_signers_come_from_eth_accounts() {
        let (network, mock) = mocked_network(TxOptions::default());
        mock.push::<Vec<Address>, _>(vec![DEV_ADDRESS, Address::repeat_byte(0xdd)])
            .unwrap();

        let signers = network.signers().await.unwrap();

        assert_eq!(signers.len(), 2);
        assert_eq!(signers[0].address, DEV_ADDRESS);
    }

    #[tokio::test]
    async fn empty_node_accounts_is_a_provider_error() {
        let (network, mock) = mocked_network(TxOptions::default());
        mock.push::<Vec<Address>, _>(Vec::new()).unwrap();

        let artifacts = tempfile::tempdir().unwrap();
        let registry =
            RpcArtifactRegistry::new(ArtifactDir::new(artifacts.path()), network.clone());

        let err = Deployer::new(network, registry, ContractName::default())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, DeploymentError::Provider(_)));
    }

    #[test]
    fn builds_contract_creation_transactions() {
        let from = DEV_ADDRESS;
        let data = Bytes::from(vec![0x60, 0x80]);

        let eip1559 = network(None, TxOptions::default())
            .deployment_transaction(from, data.clone());
        let legacy = network(
            None,
            TxOptions {
                legacy: true,
                ..TxOptions::default()
            },
        )
        .deployment_transaction(from, data.clone());

        assert!(matches!(eip1559, TypedTransaction::Eip1559(_)));
        assert!(matches!(legacy, TypedTransaction::Legacy(_)));

        for tx in [eip1559, legacy] {
            assert_eq!(tx.to(), None::<&NameOrAddress>);
            assert_eq!(tx.from(), Some(&from));
            assert_eq!(tx.data(), Some(&data));
        }
    }

    fn legacy() -> TxOptions {
        TxOptions {
            legacy: true,
            ..TxOptions::default()
        }
    }

    /// Queues the gas price and gas estimate a legacy send asks for first.
    fn push_gas(mock: &MockProvider) {
        mock.push::<U256, _>(U256::from(21_000)).unwrap();
        mock.push::<U256, _>(U256::from(1_000_000_000u64)).unwrap();
    }

    #[tokio::test]
    async fn node_send_returns_the_transaction_hash() {
        let (network, mock) = mocked_network(legacy());
        mock.push::<TxHash, _>(TX_HASH).unwrap();
        push_gas(&mock);

        let tx = network.deployment_transaction(DEV_ADDRESS, Bytes::from(vec![0x60]));
        let tx_hash = bounded(network.send(tx)).await.unwrap();

        assert_eq!(tx_hash, TX_HASH);
    }

    #[tokio::test]
    async fn rejected_send_is_a_submission_error() {
        let (network, mock) = mocked_network(legacy());
        mock.push_response(MockResponse::Error(JsonRpcError {
            code: -32000,
            message: "insufficient funds for gas * price + value".to_string(),
            data: None,
        }));
        push_gas(&mock);

        let tx = network.deployment_transaction(DEV_ADDRESS, Bytes::from(vec![0x60]));
        let err = bounded(network.send(tx)).await.unwrap_err();

        assert!(
            matches!(&err, DeploymentError::Submission(reason) if reason.contains("insufficient funds")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn successful_receipt_yields_the_contract_address() {
        let (network, mock) = mocked_network(TxOptions::default());
        push_mined(&mock, receipt(1, Some(CONTRACT)));

        let deployed = bounded(pending(network).wait_for_deployment())
            .await
            .unwrap();

        assert_eq!(
            deployed,
            DeployedContract {
                address: CONTRACT,
                transaction_hash: TX_HASH,
                block_number: Some(1),
            }
        );
    }

    #[tokio::test]
    async fn reverted_receipt_is_a_confirmation_error() {
        let (network, mock) = mocked_network(TxOptions::default());
        push_mined(&mock, receipt(0, Some(CONTRACT)));

        let err = bounded(pending(network).wait_for_deployment())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, DeploymentError::Confirmation(reason) if reason.ends_with("reverted")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn receipt_without_contract_address_is_a_confirmation_error() {
        let (network, mock) = mocked_network(TxOptions::default());
        push_mined(&mock, receipt(1, None));

        let err = bounded(pending(network).wait_for_deployment())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, DeploymentError::Confirmation(reason) if reason.contains("no contract address")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn dropped_transaction_is_a_confirmation_error() {
        let (network, mock) = mocked_network(TxOptions::default());
        // The first lookup plus three retries
        for _ in 0..4 {
            mock.push::<serde_json::Value, _>(serde_json::Value::Null).unwrap();
        }

        let err = bounded(pending(network).wait_for_deployment())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, DeploymentError::Confirmation(reason) if reason.ends_with("was dropped")),
            "unexpected error: {err:?}"
        );
    }
}
