//! Implementations of the deployment collaborators on top of an Ethereum
//! RPC provider.

use {
    crate::deployer::{
        CompiledContract, ContractFactory, DeployError, Deployment, SignerProvider,
    },
    alloy::{
        network::{Ethereum, TransactionBuilder as _},
        providers::{
            DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider as _,
            ProviderBuilder, WatchTxError,
        },
        rpc::types::{TransactionReceipt, TransactionRequest},
    },
    alloy_dyn_abi::{DynSolType, DynSolValue, Specifier as _},
    alloy_primitives::Address,
    anyhow::{Context as _, anyhow},
    contracts::{Artifact, ArtifactError, ArtifactRegistry},
    std::{sync::Mutex, time::Duration},
    url::Url,
};

/// Creates a provider talking JSON RPC to the given node.
pub fn provider(url: &Url) -> DynProvider {
    ProviderBuilder::new().connect_http(url.clone()).erased()
}

/// Signers managed by the connected node, in the order the node reports
/// them.
pub struct EthSignerProvider {
    provider: DynProvider,
}

impl EthSignerProvider {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl SignerProvider for EthSignerProvider {
    async fn list_signers(&self) -> anyhow::Result<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .context("could not list the node's accounts")
    }
}

/// Resolves artifacts from a registry and deploys them through the
/// provider.
pub struct EthContractFactory {
    provider: DynProvider,
    registry: ArtifactRegistry,
    confirmation_timeout: Duration,
}

impl EthContractFactory {
    pub fn new(
        provider: DynProvider,
        registry: ArtifactRegistry,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            registry,
            confirmation_timeout,
        }
    }
}

impl ContractFactory for EthContractFactory {
    fn resolve(&self, name: &str) -> Result<Box<dyn CompiledContract>, DeployError> {
        let artifact = self.registry.load(name).map_err(|err| match err {
            ArtifactError::NotFound { name } => DeployError::ArtifactNotFound(name),
            err @ ArtifactError::Invalid { .. } => DeployError::Other(err.into()),
        })?;
        Ok(Box::new(EthCompiledContract {
            provider: self.provider.clone(),
            artifact,
            confirmation_timeout: self.confirmation_timeout,
        }))
    }
}

struct EthCompiledContract {
    provider: DynProvider,
    artifact: Artifact,
    confirmation_timeout: Duration,
}

#[async_trait::async_trait]
impl CompiledContract for EthCompiledContract {
    async fn deploy(
        &self,
        from: Address,
        constructor_args: Vec<DynSolValue>,
    ) -> Result<Box<dyn Deployment>, DeployError> {
        let code = creation_code(&self.artifact, &constructor_args)?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|err| DeployError::SubmissionFailed(err.into()))?
            .with_timeout(Some(self.confirmation_timeout));
        tracing::debug!(
            contract = %self.artifact.contract_name,
            tx = %pending.tx_hash(),
            "creation transaction submitted"
        );
        Ok(Box::new(EthDeployment {
            pending: Mutex::new(Some(pending)),
        }))
    }
}

/// Checks the constructor arguments against the artifact's declared
/// constructor and returns the full creation code: the bytecode followed by
/// the ABI encoded arguments. The check happens before submission so a
/// mismatch can never surface after the transaction is on the network.
fn creation_code(artifact: &Artifact, args: &[DynSolValue]) -> Result<Vec<u8>, DeployError> {
    let mismatch = |reason: String| DeployError::ConstructorMismatch {
        name: artifact.contract_name.clone(),
        reason,
    };

    let inputs = artifact
        .abi
        .constructor
        .iter()
        .flat_map(|constructor| &constructor.inputs)
        .map(|param| param.resolve())
        .collect::<Result<Vec<DynSolType>, _>>()
        .map_err(|err| mismatch(err.to_string()))?;

    if inputs.len() != args.len() {
        return Err(mismatch(format!(
            "expected {} constructor arguments, got {}",
            inputs.len(),
            args.len()
        )));
    }
    for (ty, value) in inputs.iter().zip(args) {
        if !ty.matches(value) {
            return Err(mismatch(format!("argument {value:?} is not a {ty}")));
        }
    }

    let mut code = artifact.bytecode.to_vec();
    if !args.is_empty() {
        code.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
    }
    Ok(code)
}

/// A submitted creation transaction. The pending to confirmed transition is
/// driven by the node; awaiting the receipt consumes the handle.
struct EthDeployment {
    pending: Mutex<Option<PendingTransactionBuilder<Ethereum>>>,
}

#[async_trait::async_trait]
impl Deployment for EthDeployment {
    async fn confirmed(&self) -> Result<Address, DeployError> {
        let pending = self
            .pending
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| DeployError::ConfirmationFailed(anyhow!("deployment already awaited")))?;
        let receipt = pending.get_receipt().await.map_err(|err| match err {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                DeployError::ConfirmationTimeout
            }
            err => DeployError::ConfirmationFailed(err.into()),
        })?;
        confirmed_address(receipt)
    }
}

/// Maps the mined receipt to the deployed contract's address. A reverted
/// creation transaction and a receipt without a contract address both fail
/// the confirmation.
fn confirmed_address(receipt: TransactionReceipt) -> Result<Address, DeployError> {
    if !receipt.status() {
        return Err(DeployError::ConfirmationFailed(anyhow!(
            "the creation transaction reverted"
        )));
    }
    receipt.contract_address.ok_or_else(|| {
        DeployError::ConfirmationFailed(anyhow!("the receipt carries no contract address"))
    })
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::providers::mock::Asserter, alloy_primitives::address};

    fn token_artifact() -> Artifact {
        ArtifactRegistry::vendored().load("OcosMainToken").unwrap()
    }

    fn mocked_provider(asserter: Asserter) -> DynProvider {
        ProviderBuilder::new()
            .connect_mocked_client(asserter)
            .erased()
    }

    #[test]
    fn creation_code_appends_encoded_owner() {
        let artifact = token_artifact();
        let owner = address!("000000000000000000000000000000000000a111");

        let code = creation_code(&artifact, &[DynSolValue::Address(owner)]).unwrap();

        let (bytecode, args) = code.split_at(artifact.bytecode.len());
        assert_eq!(bytecode, artifact.bytecode.as_ref());
        let mut expected = [0_u8; 32];
        expected[12..].copy_from_slice(owner.as_slice());
        assert_eq!(args, expected);
    }

    #[test]
    fn constructor_arity_is_checked_before_submission() {
        let err = creation_code(&token_artifact(), &[]).unwrap_err();
        assert!(matches!(err, DeployError::ConstructorMismatch { .. }));
    }

    #[test]
    fn constructor_types_are_checked_before_submission() {
        let err = creation_code(&token_artifact(), &[DynSolValue::Bool(true)]).unwrap_err();
        assert!(matches!(err, DeployError::ConstructorMismatch { .. }));
    }

    #[test]
    fn artifact_without_constructor_takes_no_arguments() {
        let artifact = Artifact {
            contract_name: "NoConstructor".to_string(),
            abi: serde_json::from_str("[]").unwrap(),
            bytecode: vec![0x60, 0x80].into(),
        };
        assert_eq!(
            creation_code(&artifact, &[]).unwrap(),
            artifact.bytecode.to_vec()
        );
        assert!(matches!(
            creation_code(&artifact, &[DynSolValue::Bool(true)]).unwrap_err(),
            DeployError::ConstructorMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn lists_signers_in_node_order() {
        let accounts = vec![
            address!("00000000000000000000000000000000000000a1"),
            address!("00000000000000000000000000000000000000a2"),
        ];
        let asserter = Asserter::new();
        asserter.push_success(&accounts);

        let signers = EthSignerProvider::new(mocked_provider(asserter))
            .list_signers()
            .await
            .unwrap();
        assert_eq!(signers, accounts);
    }

    fn receipt(status: &str, contract_address: Option<&str>) -> TransactionReceipt {
        serde_json::from_value(serde_json::json!({
            "transactionHash":
                "0x1111111111111111111111111111111111111111111111111111111111111111",
            "transactionIndex": "0x0",
            "blockHash":
                "0x2222222222222222222222222222222222222222222222222222222222222222",
            "blockNumber": "0x1",
            "from": "0x00000000000000000000000000000000000000a1",
            "to": null,
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "contractAddress": contract_address,
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "type": "0x2",
            "status": status,
        }))
        .unwrap()
    }

    #[test]
    fn confirmed_receipt_yields_the_contract_address() {
        let deployed = "0x00000000000000000000000000000000000000b2";
        let address = confirmed_address(receipt("0x1", Some(deployed))).unwrap();
        assert_eq!(address, address!("00000000000000000000000000000000000000b2"));
    }

    #[test]
    fn reverted_creation_transaction_fails_confirmation() {
        let deployed = "0x00000000000000000000000000000000000000b2";
        let err = confirmed_address(receipt("0x0", Some(deployed))).unwrap_err();
        assert!(matches!(err, DeployError::ConfirmationFailed(_)));
    }

    #[test]
    fn receipt_without_contract_address_fails_confirmation() {
        let err = confirmed_address(receipt("0x1", None)).unwrap_err();
        assert!(matches!(err, DeployError::ConfirmationFailed(_)));
    }

    #[tokio::test]
    async fn deployment_handle_is_single_shot() {
        // A handle whose pending transaction was already consumed cannot be
        // awaited again.
        let deployment = EthDeployment {
            pending: Mutex::new(None),
        };
        let err = deployment.confirmed().await.unwrap_err();
        assert!(matches!(err, DeployError::ConfirmationFailed(_)));
    }

    #[test]
    fn unknown_artifact_resolves_to_not_found() {
        let factory = EthContractFactory::new(
            mocked_provider(Asserter::new()),
            ArtifactRegistry::vendored(),
            Duration::from_secs(1),
        );
        let err = factory.resolve("NoSuchContract").unwrap_err();
        assert!(matches!(err, DeployError::ArtifactNotFound(name) if name == "NoSuchContract"));
    }
}
