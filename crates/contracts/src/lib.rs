//! Compiled contract artifacts and the registry that resolves them by name.
//!
//! Artifacts are the JSON files emitted by the Solidity toolchain, one per
//! contract, containing the contract's ABI and creation bytecode. The
//! canonical OCOS artifacts are vendored under `artifacts/`.

pub mod paths;

use {
    alloy_json_abi::JsonAbi,
    alloy_primitives::Bytes,
    serde::Deserialize,
    std::path::PathBuf,
};

/// A compiled contract: its interface description plus creation bytecode.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The toolchain has not compiled an artifact with this name.
    #[error("no compiled artifact named {name:?}")]
    NotFound { name: String },
    /// The artifact file exists but cannot be parsed.
    #[error("artifact {name:?} is not readable")]
    Invalid {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Resolves contract names to compiled artifacts within a single
/// artifacts directory, following the `<dir>/<ContractName>.json`
/// convention of the compiler output.
#[derive(Clone, Debug)]
pub struct ArtifactRegistry {
    dir: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Registry over the artifacts vendored with this crate.
    pub fn vendored() -> Self {
        Self::new(paths::contract_artifacts_dir())
    }

    pub fn load(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let path = self.dir.join(format!("{name}.json"));
        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(err) => {
                return Err(ArtifactError::Invalid {
                    name: name.to_string(),
                    source: anyhow::Error::new(err).context(path.display().to_string()),
                });
            }
        };
        serde_json::from_slice(&contents).map_err(|err| ArtifactError::Invalid {
            name: name.to_string(),
            source: anyhow::Error::new(err).context(path.display().to_string()),
        })
    }
}
