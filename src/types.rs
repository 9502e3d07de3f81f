use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

pub const DEFAULT_CONTRACT_NAME: &str = "ClearSettle";

/// Either a bare contract name (`ClearSettle`) or a fully qualified one
/// (`contracts/ClearSettle.sol:ClearSettle`).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Shrinkwrap,
)]
#[serde(transparent)]
pub struct ContractName(pub String);

impl ContractName {
    /// The contract part, without the source path.
    pub fn contract(&self) -> &str {
        self.0
            .rsplit_once(':')
            .map_or(self.0.as_str(), |(_, contract)| contract)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.0
            .rsplit_once(':')
            .map(|(source_path, _)| Path::new(source_path))
    }
}

impl Default for ContractName {
    fn default() -> Self {
        Self(DEFAULT_CONTRACT_NAME.to_string())
    }
}

impl FromStr for ContractName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The token contract address handed to the constructor.
///
/// Outside of local networks this has to be `Explicit`, the placeholder
/// only exists so the contract can be deployed without a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenAddress {
    /// Reuse the deployer's own address.
    #[default]
    DeployerPlaceholder,
    Explicit(Address),
}

impl TokenAddress {
    pub fn resolve(self, deployer: Address) -> Address {
        match self {
            Self::DeployerPlaceholder => deployer,
            Self::Explicit(address) => address,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::DeployerPlaceholder)
    }
}

impl From<Option<Address>> for TokenAddress {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Self::DeployerPlaceholder, Self::Explicit)
    }
}
