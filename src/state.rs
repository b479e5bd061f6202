use ethers::types::Address;
use serde::Serialize;
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
};

/// Messages delivered to the session's event queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Wallet reported a new list of authorized accounts
    AccountsChanged(Vec<Address>),
    /// Wallet switched to another network
    ChainChanged(u64),
    Disconnect,
    /// The owner tore the session down, stop draining the queue
    Shutdown,
}

/// What the session does once the wallet switched networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainChangePolicy {
    /// Restart the whole page, the network client is rebuilt on load
    #[default]
    Reload,
    /// Drop the network client and open a new one in place
    RebuildClient,
}

/// Follow-up work the session performs after a message was folded into the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Unchanged,
    Cleared,
    AccountSwapped(Address),
    /// Account reported while no client session is open. Nothing was stored yet.
    Adopt(Address),
    Reload(u64),
    RebuildClient(u64),
    Shutdown,
}

/// Connection state of a single wallet session
pub struct ConnectionState<C> {
    account: Option<Address>,
    chain_id: Option<u64>,
    is_connecting: bool,
    provider: Option<Rc<C>>,
}

impl<C> Default for ConnectionState<C> {
    fn default() -> Self {
        Self { account: None, chain_id: None, is_connecting: false, provider: None }
    }
}

impl<C> Debug for ConnectionState<C> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "ConnectionState with account: {:?}, chain_id: {:?}, connecting: {}, provider: {}",
            self.account,
            self.chain_id,
            self.is_connecting,
            self.provider.is_some()
        )
    }
}

impl<C> ConnectionState<C> {
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn is_connecting(&self) -> bool {
        self.is_connecting
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some() && self.provider.is_some()
    }

    pub fn provider(&self) -> Option<Rc<C>> {
        self.provider.clone()
    }

    pub(crate) fn set_connecting(&mut self, connecting: bool) {
        self.is_connecting = connecting;
    }

    pub(crate) fn establish(&mut self, account: Address, provider: Rc<C>, chain_id: Option<u64>) {
        self.account = Some(account);
        self.provider = Some(provider);
        self.chain_id = chain_id;
    }

    pub(crate) fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = Some(chain_id);
    }

    pub(crate) fn replace_provider(&mut self, provider: Rc<C>) {
        if self.account.is_some() {
            self.provider = Some(provider);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.account = None;
        self.provider = None;
        self.chain_id = None;
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            account: self.account.map(|a| format!("{a:?}")).unwrap_or_default(),
            chain_id: self.chain_id,
            is_connecting: self.is_connecting,
            is_connected: self.is_connected(),
        }
    }
}

/// Plain copy of the connection state handed to UI consumers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    /// Lowercase hex address, empty when disconnected
    pub account: String,
    pub chain_id: Option<u64>,
    pub is_connecting: bool,
    pub is_connected: bool,
}

/// Folds one message into the state
pub fn reduce<C>(
    state: &mut ConnectionState<C>,
    message: &Message,
    policy: ChainChangePolicy,
) -> Effect {
    match message {
        Message::Disconnect => {
            state.clear();
            Effect::Cleared
        }
        Message::AccountsChanged(accounts) => match accounts.first() {
            None => {
                state.clear();
                Effect::Cleared
            }
            Some(account) if state.provider.is_none() => Effect::Adopt(*account),
            Some(account) if state.account == Some(*account) => Effect::Unchanged,
            Some(account) => {
                state.account = Some(*account);
                Effect::AccountSwapped(*account)
            }
        },
        Message::ChainChanged(chain_id) => {
            if state.is_connected() {
                state.set_chain_id(*chain_id);
            }
            match policy {
                ChainChangePolicy::Reload => Effect::Reload(*chain_id),
                ChainChangePolicy::RebuildClient if state.is_connected() => {
                    Effect::RebuildClient(*chain_id)
                }
                ChainChangePolicy::RebuildClient => Effect::Unchanged,
            }
        }
        Message::Shutdown => Effect::Shutdown,
    }
}
