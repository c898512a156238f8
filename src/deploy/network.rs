// Network Config - per-network deployment parameters

use crate::deploy::DeployError;
use crate::identity::Address;
use crate::units::GWEI;
use serde::{Deserialize, Serialize};

/// Networks where a mock price feed is deployed instead of using a live one
pub const DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost"];

const DEVELOPMENT_CHAIN_ID: u64 = 31337;

/// ETH/USD aggregator on rinkeby, 0x8A753747A1Fa494EC906cE90E9f37563A8AF630e
const RINKEBY_ETH_USD_FEED: [u8; 20] = [
    0x8a, 0x75, 0x37, 0x47, 0xa1, 0xfa, 0x49, 0x4e, 0xc9, 0x06, 0xce, 0x90, 0xe9, 0xf3, 0x75, 0x63,
    0xa8, 0xaf, 0x63, 0x0e,
];

/// Deployment parameters of one network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// Live ETH/USD feed; None on development networks
    pub eth_usd_price_feed: Option<Address>,
    /// Blocks to wait after deployment before verification
    pub block_confirmations: u32,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl NetworkConfig {
    fn development(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chain_id: DEVELOPMENT_CHAIN_ID,
            eth_usd_price_feed: None,
            block_confirmations: 1,
            gas_limit: 30_000_000,
            gas_price: GWEI,
        }
    }

    /// In-process development network
    pub fn hardhat() -> Self {
        Self::development("hardhat")
    }

    /// Locally running development node
    pub fn localhost() -> Self {
        Self::development("localhost")
    }

    pub fn rinkeby() -> Self {
        Self {
            name: "rinkeby".to_string(),
            chain_id: 4,
            eth_usd_price_feed: Some(Address::from_bytes(RINKEBY_ETH_USD_FEED)),
            block_confirmations: 6,
            gas_limit: 2_100_000,
            gas_price: 8 * GWEI,
        }
    }

    /// Look up a known network by name
    pub fn lookup(name: &str) -> Result<Self, DeployError> {
        match name {
            "hardhat" => Ok(Self::hardhat()),
            "localhost" => Ok(Self::localhost()),
            "rinkeby" => Ok(Self::rinkeby()),
            other => Err(DeployError::UnknownNetwork(other.to_string())),
        }
    }

    pub fn is_development(&self) -> bool {
        DEVELOPMENT_CHAINS.contains(&self.name.as_str())
    }

    pub fn with_price_feed(mut self, feed: Address) -> Self {
        self.eth_usd_price_feed = Some(feed);
        self
    }

    pub fn with_block_confirmations(mut self, confirmations: u32) -> Self {
        self.block_confirmations = confirmations;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.gas_limit == 0 {
            return Err(DeployError::InvalidConfig("gas_limit cannot be 0".to_string()));
        }
        if !self.is_development() && self.eth_usd_price_feed.is_none() {
            return Err(DeployError::MissingPriceFeed(self.name.clone()));
        }
        Ok(())
    }
}

/// Deployment settings taken from the process environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployEnv {
    pub network: String,
    /// Block explorer credential; verification is skipped without it
    pub verify_api_key: Option<String>,
}

impl Default for DeployEnv {
    fn default() -> Self {
        Self {
            network: "hardhat".to_string(),
            verify_api_key: None,
        }
    }
}

impl DeployEnv {
    pub fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            verify_api_key: None,
        }
    }

    /// Build from `FUNDME_NETWORK` and `ETHERSCAN_API_KEY`, falling back to defaults
    pub fn from_env() -> Self {
        let mut env = Self::default();

        if let Ok(network) = std::env::var("FUNDME_NETWORK") {
            if !network.trim().is_empty() {
                env.network = network.trim().to_string();
            }
        }
        if let Ok(key) = std::env::var("ETHERSCAN_API_KEY") {
            if !key.trim().is_empty() {
                env.verify_api_key = Some(key.trim().to_string());
            }
        }

        env
    }

    pub fn with_verify_api_key(mut self, key: &str) -> Self {
        self.verify_api_key = Some(key.to_string());
        self
    }
}
