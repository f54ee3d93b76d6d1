//! The deployment workflow: resolve a signing account, submit the creation
//! transaction for a named artifact with the account as the contract's
//! owner, and wait for the network to confirm it.
//!
//! The collaborators are traits so the workflow can be driven by a fake
//! network in tests.

use {alloy_dyn_abi::DynSolValue, alloy_primitives::Address, std::sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("no signer available to deploy with")]
    NoSignerAvailable,
    #[error("no compiled artifact named {0:?}")]
    ArtifactNotFound(String),
    #[error("constructor arguments do not match artifact {name:?}: {reason}")]
    ConstructorMismatch { name: String, reason: String },
    #[error("submitting the creation transaction failed")]
    SubmissionFailed(#[source] anyhow::Error),
    #[error("timed out waiting for the creation transaction to be confirmed")]
    ConfirmationTimeout,
    #[error("the creation transaction failed to confirm")]
    ConfirmationFailed(#[source] anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Supplies the accounts that can authorize transactions on the target
/// network.
#[mockall::automock]
#[async_trait::async_trait]
pub trait SignerProvider: Send + Sync + 'static {
    /// Lists the available signing accounts in the order the node reports
    /// them.
    async fn list_signers(&self) -> anyhow::Result<Vec<Address>>;
}

/// Resolves compiled artifacts to deployable contract interfaces.
#[mockall::automock]
pub trait ContractFactory: Send + Sync + 'static {
    fn resolve(&self, name: &str) -> Result<Box<dyn CompiledContract>, DeployError>;
}

/// A resolved artifact that can submit its own creation transaction.
#[mockall::automock]
#[async_trait::async_trait]
pub trait CompiledContract: Send + Sync + 'static {
    /// Submits the creation transaction signed by `from` and returns once
    /// the network has accepted it into the transaction pool. The returned
    /// deployment is pending until awaited.
    async fn deploy(
        &self,
        from: Address,
        constructor_args: Vec<DynSolValue>,
    ) -> Result<Box<dyn Deployment>, DeployError>;
}

impl std::fmt::Debug for dyn CompiledContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CompiledContract")
    }
}

/// A submitted creation transaction. Starts out pending and transitions to
/// confirmed once the network has mined it; the transition is driven
/// entirely by the network.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Deployment: Send + Sync + 'static {
    /// Waits until the creation transaction is mined and returns the
    /// address of the new contract.
    async fn confirmed(&self) -> Result<Address, DeployError>;
}

/// Executes the deployment workflow exactly once per invocation.
///
/// Each successful run creates a new, distinct contract instance; there is
/// no retry and no fallback signer or artifact on failure.
pub struct Deployer {
    signers: Arc<dyn SignerProvider>,
    factory: Arc<dyn ContractFactory>,
    artifact: String,
}

impl Deployer {
    pub fn new(
        signers: Arc<dyn SignerProvider>,
        factory: Arc<dyn ContractFactory>,
        artifact: String,
    ) -> Self {
        Self {
            signers,
            factory,
            artifact,
        }
    }

    /// Deploys the configured artifact with the first available signer as
    /// both the submitting account and the contract's owner.
    pub async fn run(&self) -> Result<Address, DeployError> {
        let signers = self.signers.list_signers().await?;
        let deployer = *signers.first().ok_or(DeployError::NoSignerAvailable)?;
        tracing::info!("Deploying contract with account: {deployer}");

        let contract = self.factory.resolve(&self.artifact)?;
        let deployment = contract
            .deploy(deployer, vec![DynSolValue::Address(deployer)])
            .await?;
        deployment.confirmed().await
    }
}
