//! Seams between the session and the outside world: the injected wallet and the network client
//! opened against it.

pub mod error;

use crate::state::Message;
use async_trait::async_trait;
use error::WalletError;
use ethers::{
    providers::{JsonRpcClient, Middleware, Provider},
    types::{Address, U256},
};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use tokio::sync::mpsc::UnboundedSender;

/// Capabilities an injected wallet (EIP-1193) exposes to the page
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WalletProvider {
    /// Network client session bound to this wallet
    type Client: NetworkClient;

    /// Accounts the page is already authorized for. Never prompts the user.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Asks the user for authorization through the wallet prompt
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Asks the wallet to change its active network
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Forwards `accountsChanged` and `chainChanged` into `sink` until the returned handle is
    /// released
    fn subscribe(&self, sink: UnboundedSender<Message>) -> Result<Subscription, WalletError>;

    fn open_client(&self) -> Result<Self::Client, WalletError>;
}

/// Read-only blockchain queries made through the wallet
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait NetworkClient {
    /// Native currency balance in wei
    async fn balance(&self, account: Address) -> Result<U256, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<P: JsonRpcClient> NetworkClient for Provider<P> {
    async fn balance(&self, account: Address) -> Result<U256, WalletError> {
        Ok(self.get_balance(account, None).await?)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.get_chainid().await?.low_u64())
    }
}

/// Live event subscription on the wallet. Listeners are removed on [`Subscription::release`] or
/// when the handle is dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "Subscription (active: {})", self.release.is_some())
    }
}

impl Subscription {
    pub fn new<F: FnOnce() + 'static>(release: F) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    pub fn release(mut self) {
        self.release_listeners();
    }

    fn release_listeners(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_listeners();
    }
}
