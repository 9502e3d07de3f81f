use eyre::Context;
use tracing::{info, warn};

use crate::artifacts::ArtifactDir;
use crate::cli::Args;
use crate::config::{Config, Settings};
use crate::network::{RpcArtifactRegistry, RpcNetwork, TxOptions};
use crate::report::DeploymentReport;
use crate::serde_utils;

pub mod deployer;
pub mod error;
pub mod interfaces;

pub use self::deployer::{Deployer, DeploymentOutcome};
pub use self::error::DeploymentError;
pub use self::interfaces::{
    ArtifactRegistry, ContractFactory, DeployedContract, PendingDeployment,
    SignerIdentity, SignerProvider,
};

pub async fn run_deployment(args: Args) -> eyre::Result<()> {
    let config: Config = match args.config.as_ref() {
        Some(path) => serde_utils::read_deserialize(path).await?,
        None => Config::default(),
    };

    let settings = Settings::merge(args, config);

    if settings.private_key.is_none() {
        warn!("No private key given, signing with the node's first account");
    }

    let network = RpcNetwork::connect(
        settings.rpc_url.as_str(),
        settings.private_key.as_ref(),
        settings.poll_interval,
        TxOptions {
            legacy: settings.legacy,
            confirmations: settings.confirmations,
        },
    )
    .await?;

    let artifacts = ArtifactDir::new(&settings.artifacts_dir);
    info!("Reading artifacts from {}", artifacts.root().display());

    let registry = RpcArtifactRegistry::new(artifacts, network.clone());

    let deployer =
        Deployer::new(network.clone(), registry, settings.contract.clone())
            .with_token_address(settings.token_address);

    let outcome = deployer.run().await?;

    println!("{outcome}");

    if let Some(report_path) = settings.report.as_ref() {
        let report = DeploymentReport::new(
            network.chain_id(),
            &outcome,
            settings.token_address.is_placeholder(),
        );

        serde_utils::write_serialize(report_path, &report)
            .await
            .context("Writing deployment report")?;

        info!("Report written to {}", report_path.display());
    }

    Ok(())
}
