use std::path::{Path, PathBuf};

use ethers::abi::{Abi, Constructor, ParamType, Token};
use ethers::types::{Address, Bytes};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::deployment::DeploymentError;
use crate::types::ContractName;

/// Hardhat keeps its compiler inputs here, never contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: ContractName,
    pub abi: Abi,
    pub bytecode: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    abi: Abi,
    bytecode: ArtifactBytecode,
}

/// Hardhat stores the bytecode as a hex string, Foundry nests it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

impl From<ArtifactBytecode> for Bytes {
    fn from(value: ArtifactBytecode) -> Self {
        match value {
            ArtifactBytecode::Hex(bytes) => bytes,
            ArtifactBytecode::Object { object } => object,
        }
    }
}

impl Artifact {
    pub fn from_json(
        contract_name: ContractName,
        json: &str,
    ) -> Result<Self, DeploymentError> {
        let file: ArtifactFile = serde_json::from_str(json).map_err(|err| {
            DeploymentError::invalid_artifact(&contract_name, err)
        })?;

        let bytecode: Bytes = file.bytecode.into();
        if bytecode.is_empty() {
            return Err(DeploymentError::invalid_artifact(
                &contract_name,
                "bytecode is empty, the contract is abstract or an interface",
            ));
        }

        Ok(Self {
            contract_name,
            abi: file.abi,
            bytecode,
        })
    }

    /// The constructor must take exactly one address, the token contract.
    pub fn check_constructor(&self) -> Result<&Constructor, DeploymentError> {
        let constructor = self.abi.constructor().ok_or_else(|| {
            DeploymentError::invalid_artifact(
                &self.contract_name,
                "no constructor, expected constructor(address)",
            )
        })?;

        let params: Vec<_> =
            constructor.inputs.iter().map(|input| &input.kind).collect();

        if params != [&ParamType::Address] {
            return Err(DeploymentError::invalid_artifact(
                &self.contract_name,
                format!(
                    "expected constructor(address), found constructor({})",
                    params
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                ),
            ));
        }

        Ok(constructor)
    }

    /// Creation bytecode followed by the ABI encoded constructor argument.
    pub fn deployment_data(
        &self,
        token_address: Address,
    ) -> Result<Bytes, DeploymentError> {
        let data = self
            .check_constructor()?
            .encode_input(
                self.bytecode.to_vec(),
                &[Token::Address(token_address)],
            )
            .map_err(|err| {
                DeploymentError::invalid_artifact(&self.contract_name, err)
            })?;

        Ok(data.into())
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn load(
        &self,
        name: &ContractName,
    ) -> Result<Artifact, DeploymentError> {
        let path = self.find(name).await?;

        debug!("Loading artifact from {}", path.display());

        let json = tokio::fs::read_to_string(&path).await.map_err(|err| {
            DeploymentError::invalid_artifact(
                name,
                format!("reading {}: {err}", path.display()),
            )
        })?;

        Artifact::from_json(name.clone(), &json)
    }

    /// A fully qualified name resolves to `<root>/<source path>/<Name>.json`.
    /// A bare name prefers `<Name>.sol/<Name>.json` anywhere under the root
    /// and falls back to any `<Name>.json`.
    pub async fn find(
        &self,
        name: &ContractName,
    ) -> Result<PathBuf, DeploymentError> {
        match name.source_path() {
            Some(source_path) => self.find_qualified(name, source_path).await,
            None => self.search(name).await,
        }
    }

    async fn find_qualified(
        &self,
        name: &ContractName,
        source_path: &Path,
    ) -> Result<PathBuf, DeploymentError> {
        let file_name = format!("{}.json", name.contract());

        // Foundry drops the source directories, `out/<File>.sol/<Name>.json`
        let mut candidates = vec![self.root.join(source_path).join(&file_name)];
        if let Some(source_file) = source_path.file_name() {
            candidates.push(self.root.join(source_file).join(&file_name));
        }

        for candidate in candidates {
            match tokio::fs::metadata(&candidate).await {
                Ok(metadata) if metadata.is_file() => return Ok(candidate),
                Ok(_) => debug!("{} is not a file", candidate.display()),
                Err(err) => debug!("Skipping {}: {err}", candidate.display()),
            }
        }

        Err(DeploymentError::ArtifactNotFound(name.to_string()))
    }

    async fn search(
        &self,
        name: &ContractName,
    ) -> Result<PathBuf, DeploymentError> {
        let file_name = format!("{}.json", name.contract());
        let source_dir = format!("{}.sol", name.contract());

        let mut preferred = vec![];
        let mut fallback = vec![];

        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if dir == self.root => {
                    debug!("Can't read {}: {err}", dir.display());
                    return Err(DeploymentError::ArtifactNotFound(
                        name.to_string(),
                    ));
                }
                Err(err) => {
                    debug!("Skipping {}: {err}", dir.display());
                    continue;
                }
            };

            while let Some(entry) = entries.next_entry().await.map_err(|err| {
                DeploymentError::invalid_artifact(
                    name,
                    format!("listing {}: {err}", dir.display()),
                )
            })? {
                let path = entry.path();
                let is_dir = match entry.file_type().await {
                    Ok(file_type) => file_type.is_dir(),
                    Err(err) => {
                        debug!("Can't stat {}: {err}", path.display());
                        continue;
                    }
                };

                if is_dir {
                    if entry.file_name() != BUILD_INFO_DIR {
                        pending.push(path);
                    }
                    continue;
                }

                if entry.file_name().to_str() != Some(file_name.as_str()) {
                    continue;
                }

                let in_source_dir = dir
                    .file_name()
                    .and_then(|dir_name| dir_name.to_str())
                    .is_some_and(|dir_name| dir_name == source_dir);

                if in_source_dir {
                    preferred.push(path);
                } else {
                    fallback.push(path);
                }
            }
        }

        let mut candidates = if preferred.is_empty() {
            fallback
        } else {
            preferred
        };
        candidates.sort();

        match candidates.len() {
            0 => Err(DeploymentError::ArtifactNotFound(name.to_string())),
            1 => Ok(candidates.remove(0)),
            _ => Err(DeploymentError::invalid_artifact(
                name,
                format!(
                    "multiple artifacts found, use a fully qualified name: {}",
                    candidates
                        .iter()
                        .map(|path| path.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }
}
