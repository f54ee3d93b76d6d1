pub mod arguments;
pub mod deployer;
pub mod eth;

use {
    crate::deployer::{DeployError, Deployer},
    contracts::ArtifactRegistry,
    std::sync::Arc,
};

pub async fn main(args: arguments::Arguments) -> Result<(), DeployError> {
    let provider = eth::provider(&args.node_url);
    let registry = ArtifactRegistry::new(&args.artifacts_path);
    let deployer = Deployer::new(
        Arc::new(eth::EthSignerProvider::new(provider.clone())),
        Arc::new(eth::EthContractFactory::new(
            provider,
            registry,
            args.deployment_timeout,
        )),
        args.contract,
    );

    let address = deployer.run().await?;
    tracing::info!("{} deployed to: {address}", args.contract_label);
    Ok(())
}
