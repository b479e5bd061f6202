#[cfg(target_arch = "wasm32")]
pub mod eip1193;
#[cfg(target_arch = "wasm32")]
pub(crate) mod event;
pub mod format;
pub mod logging;
pub mod login;
pub mod networks;
pub mod provider;
pub mod session;
pub mod state;

#[cfg(all(feature = "leptos", target_arch = "wasm32"))]
pub mod leptos;
#[cfg(all(feature = "yew", target_arch = "wasm32"))]
pub mod yew;

#[cfg(test)]
pub(crate) mod testing;

use ethers::types::Address;
use networks::{Networks, MAINNET_CHAIN_ID};
use provider::{error::WalletError, WalletProvider};
use std::rc::Rc;
use thiserror::Error;

pub use format::{format_address, format_balance};
pub use login::WalletIdentity;
pub use networks::{network_name, parse_chain_id};
pub use session::{Teardown, WalletInfo, WalletSession};
pub use state::{ChainChangePolicy, ConnectionSnapshot};

#[cfg(target_arch = "wasm32")]
pub use eip1193::InjectedWallet;

pub(crate) type Listener = Rc<dyn Fn(&Event, &ConnectionSnapshot)>;

pub struct WalletSessionBuilder {
    pub chain_change_policy: ChainChangePolicy,
    pub switch_target: u64,
    pub networks: Networks,
    listener: Option<Listener>,
    reload: Option<Rc<dyn Fn()>>,
}

impl Default for WalletSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletSessionBuilder {
    pub fn new() -> Self {
        Self {
            chain_change_policy: ChainChangePolicy::default(),
            switch_target: MAINNET_CHAIN_ID,
            networks: Networks::default(),
            listener: None,
            reload: None,
        }
    }

    pub fn chain_change_policy(&mut self, policy: ChainChangePolicy) -> &mut Self {
        self.chain_change_policy = policy;
        self
    }

    /// Network `switch_to_default_network` asks the wallet for
    pub fn switch_target(&mut self, chain_id: u64) -> &mut Self {
        self.switch_target = chain_id;
        self
    }

    pub fn add_network(&mut self, chain_id: u64, name: &str) -> &mut Self {
        self.networks.insert(chain_id, name);
        self
    }

    /// Called with every event the session emits and the state right after it
    pub fn on_event<F: Fn(&Event, &ConnectionSnapshot) + 'static>(
        &mut self,
        listener: F,
    ) -> &mut Self {
        self.listener = Some(Rc::new(listener));
        self
    }

    /// Replaces the page reload performed on network change
    pub fn on_reload<F: Fn() + 'static>(&mut self, reload: F) -> &mut Self {
        self.reload = Some(Rc::new(reload));
        self
    }

    pub fn build<W: WalletProvider>(&self, wallet: Option<W>) -> WalletSession<W> {
        WalletSession::new(
            wallet,
            SessionConfig {
                chain_change_policy: self.chain_change_policy,
                switch_target: self.switch_target,
                networks: self.networks.clone(),
            },
            self.listener.clone(),
            self.reload.clone().unwrap_or_else(|| Rc::new(reload_page)),
        )
    }

    /// Session over `window.ethereum`, without a wallet when none is injected
    #[cfg(target_arch = "wasm32")]
    pub fn build_injected(&self) -> WalletSession<InjectedWallet> {
        self.build(InjectedWallet::detect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub chain_change_policy: ChainChangePolicy,
    pub switch_target: u64,
    pub networks: Networks,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No wallet detected, install MetaMask to continue")]
    ProviderUnavailable,

    #[error("Wallet connection rejected by the user")]
    UserRejected,

    #[error("Error connecting wallet: {0}")]
    ConnectFailed(#[source] WalletError),

    #[error("Error switching network: {0}")]
    SwitchFailed(#[source] WalletError),

    #[error("Lookup failed: {0}")]
    LookupFailed(#[source] WalletError),

    #[error("Connection request already in progress")]
    ConnectInProgress,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connecting,
    Connected,
    ConnectFailed,
    Disconnected,
    AccountChanged(Option<Address>),
    ChainIdChanged(Option<u64>),
    /// The page is about to reload after a network change
    Reloading,
    Closed,
}

#[cfg(target_arch = "wasm32")]
fn reload_page() {
    if let Err(err) = gloo_utils::window().location().reload() {
        log::error!("Cannot reload page {err:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn reload_page() {
    log::warn!("Page reload requested outside of a browser, ignoring");
}
