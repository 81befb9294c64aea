//! CKB network definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consensus::h256;
use crate::Error;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet (Lina)
    Mainnet,
    /// Testnet (Pudge)
    Testnet,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "lina" => Ok(NetworkType::Mainnet),
            "testnet" | "pudge" => Ok(NetworkType::Testnet),
            other => Err(Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// A cell deployed at genesis that transactions reference as a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemCell {
    /// Hash of the transaction that created the cell
    pub tx_hash: [u8; 32],
    /// Output index within that transaction
    pub index: u32,
}

/// Network configuration
#[derive(Debug, Clone)]
pub struct Network {
    /// Network type
    pub network_type: NetworkType,
    /// Human-readable name
    pub name: &'static str,
    /// Dep group bundling the secp256k1 data cell and the sighash-all lock
    pub secp256k1_dep_group: SystemCell,
}

impl Network {
    /// Get mainnet parameters
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            name: "mainnet",
            secp256k1_dep_group: SystemCell {
                tx_hash: h256("71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c"),
                index: 0,
            },
        }
    }

    /// Get testnet parameters
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            name: "testnet",
            secp256k1_dep_group: SystemCell {
                tx_hash: h256("f8de3bb47d055cdf460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d37"),
                index: 0,
            },
        }
    }

    /// Get network by type
    pub const fn from_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::mainnet()
    }
}
