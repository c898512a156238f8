// Deploy module - Network selection, price feed resolution and contract deployment

mod deployer;
mod network;

pub use deployer::{
    DeployError, Deployer, Deployment, PriceFeedSource, VerificationQueue, VerificationRequest,
    Verifier,
};
pub use network::{DeployEnv, NetworkConfig, DEVELOPMENT_CHAINS};
