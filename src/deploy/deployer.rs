// Deployer - binds a price feed for the target network and deploys FundMe
//
// Development networks get a freshly deployed mock aggregator; public
// networks use the feed address from their NetworkConfig. Verification
// against a block explorer is requested only on public networks with an
// API key configured.

use crate::deploy::network::{DeployEnv, NetworkConfig};
use crate::identity::Address;
use crate::ledger::FundMe;
use crate::oracle::{MockAggregator, PriceOracle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("No ETH/USD price feed configured for network {0}")]
    MissingPriceFeed(String),

    #[error("No mock aggregator deployed on {0}")]
    MockNotDeployed(String),

    #[error("Price feed {0} is not reachable from this host")]
    FeedUnavailable(Address),

    #[error("Invalid network config: {0}")]
    InvalidConfig(String),

    #[error("Verification failed: {0}")]
    Verification(String),
}

// ============================================================================
// PRICE FEED SOURCE
// ============================================================================

/// Which kind of feed a deployment is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFeedSource {
    /// Mock aggregator deployed alongside the contract
    Mock(Address),
    /// Live feed named by the network config
    Live(Address),
}

impl PriceFeedSource {
    pub fn address(&self) -> Address {
        match self {
            PriceFeedSource::Mock(address) | PriceFeedSource::Live(address) => *address,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, PriceFeedSource::Mock(_))
    }
}

// ============================================================================
// VERIFICATION
// ============================================================================

/// Source verification request for a block explorer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub network: String,
    pub contract: Address,
    pub constructor_args: Vec<String>,
}

/// Submits deployed contracts for source verification
pub trait Verifier {
    fn verify(&mut self, request: VerificationRequest) -> Result<(), DeployError>;
}

/// Collects verification requests for an external submitter
#[derive(Clone, Debug, Default)]
pub struct VerificationQueue {
    pending: Vec<VerificationRequest>,
}

impl VerificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[VerificationRequest] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<VerificationRequest> {
        std::mem::take(&mut self.pending)
    }
}

impl Verifier for VerificationQueue {
    fn verify(&mut self, request: VerificationRequest) -> Result<(), DeployError> {
        if self.pending.iter().any(|r| r.contract == request.contract) {
            return Err(DeployError::Verification(format!(
                "{} already queued",
                request.contract
            )));
        }
        info!(contract = %request.contract, network = %request.network, "queued source verification");
        self.pending.push(request);
        Ok(())
    }
}

// ============================================================================
// DEPLOYMENT
// ============================================================================

/// Record of a deployed FundMe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub network: String,
    pub chain_id: u64,
    pub contract: Address,
    pub owner: Address,
    pub price_feed: PriceFeedSource,
    pub constructor_args: Vec<String>,
    pub block_confirmations: u32,
    pub verification_requested: bool,
}

/// Deploys contracts from one account onto one network
pub struct Deployer {
    network: NetworkConfig,
    account: Address,
    nonce: u64,
    feeds: HashMap<Address, Arc<dyn PriceOracle>>,
    mocks: Vec<Arc<MockAggregator>>,
}

impl Deployer {
    /// `nonce` is the deploying account's next transaction nonce
    pub fn new(network: NetworkConfig, account: Address, nonce: u64) -> Self {
        Self {
            network,
            account,
            nonce,
            feeds: HashMap::new(),
            mocks: Vec::new(),
        }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    /// Nonce the next deployment will use
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Make an already running feed available for binding
    pub fn register_feed(&mut self, feed: Arc<dyn PriceOracle>) {
        self.feeds.insert(feed.address(), feed);
    }

    /// Make a previously deployed mock available again
    pub fn register_mock(&mut self, mock: Arc<MockAggregator>) {
        let feed: Arc<dyn PriceOracle> = mock.clone();
        self.feeds.insert(mock.address(), feed);
        self.mocks.push(mock);
    }

    fn next_address(&mut self) -> Address {
        let address = Address::contract(&self.account, self.nonce);
        self.nonce += 1;
        address
    }

    /// Deploy an ETH/USD mock aggregator; does nothing off development networks
    pub fn deploy_mocks(&mut self) -> Option<Arc<MockAggregator>> {
        if !self.network.is_development() {
            return None;
        }

        info!(network = %self.network.name, "local network detected, deploying mocks");
        let address = self.next_address();
        let mock = Arc::new(MockAggregator::eth_usd(address));
        self.register_mock(mock.clone());
        info!(address = %address, "mocks deployed");
        Some(mock)
    }

    /// The most recently deployed mock
    pub fn latest_mock(&self) -> Option<&Arc<MockAggregator>> {
        self.mocks.last()
    }

    /// Pick the feed a new FundMe should bind to on this network
    pub fn resolve_price_feed(&self) -> Result<(PriceFeedSource, Arc<dyn PriceOracle>), DeployError> {
        if self.network.is_development() {
            let mock = self
                .latest_mock()
                .ok_or_else(|| DeployError::MockNotDeployed(self.network.name.clone()))?;
            let feed: Arc<dyn PriceOracle> = mock.clone();
            return Ok((PriceFeedSource::Mock(mock.address()), feed));
        }

        let address = self
            .network
            .eth_usd_price_feed
            .ok_or_else(|| DeployError::MissingPriceFeed(self.network.name.clone()))?;
        let feed = self
            .feeds
            .get(&address)
            .cloned()
            .ok_or(DeployError::FeedUnavailable(address))?;
        Ok((PriceFeedSource::Live(address), feed))
    }

    /// True on public networks when a verification key is configured
    pub fn should_verify(&self, env: &DeployEnv) -> bool {
        !self.network.is_development() && env.verify_api_key.is_some()
    }

    /// Deploy FundMe owned by the deploying account
    ///
    /// Verification is a separate step; see `verify_deployment`.
    pub fn deploy_fund_me(&mut self, env: &DeployEnv) -> Result<(FundMe, Deployment), DeployError> {
        self.network.validate()?;

        if self.network.is_development() && self.latest_mock().is_none() {
            self.deploy_mocks();
        }
        let (source, feed) = self.resolve_price_feed()?;

        let contract = self.next_address();
        let fund_me = FundMe::new(self.account, feed);
        let constructor_args = vec![source.address().to_string()];

        info!(
            network = %self.network.name,
            contract = %contract,
            owner = %self.account,
            price_feed = %source.address(),
            confirmations = self.network.block_confirmations,
            verify = self.should_verify(env),
            "deployed FundMe"
        );

        let deployment = Deployment {
            network: self.network.name.clone(),
            chain_id: self.network.chain_id,
            contract,
            owner: self.account,
            price_feed: source,
            constructor_args,
            block_confirmations: self.network.block_confirmations,
            verification_requested: false,
        };
        Ok((fund_me, deployment))
    }

    /// Submit a deployment for source verification when `env` allows it
    ///
    /// Returns whether a request was made. A failed request leaves the
    /// deployment in place with `verification_requested` unset.
    pub fn verify_deployment(
        &self,
        env: &DeployEnv,
        deployment: &mut Deployment,
        verifier: &mut dyn Verifier,
    ) -> Result<bool, DeployError> {
        if !self.should_verify(env) || deployment.verification_requested {
            return Ok(false);
        }

        verifier.verify(VerificationRequest {
            network: deployment.network.clone(),
            contract: deployment.contract,
            constructor_args: deployment.constructor_args.clone(),
        })?;
        deployment.verification_requested = true;
        Ok(true)
    }
}
