use crate::{
    format::{format_address, format_balance},
    networks::parse_chain_id,
    provider::{error::WalletError, NetworkClient, Subscription, WalletProvider},
    state::{reduce, ConnectionSnapshot, ConnectionState, Effect, Message},
    Event, Listener, SessionConfig, SessionError,
};
use ethers::types::{Address, U256};
use log::{debug, error, warn};
use serde::Serialize;
use std::{
    cell::{Cell, RefCell},
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
};
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    Mutex,
};

/// Connection lifecycle of one injected wallet.
///
/// Build it once at application start with [`crate::WalletSessionBuilder`] and hand clones to
/// every consumer; all clones share the same state. Call [`WalletSession::initialize`] once,
/// drive [`WalletSession::run`] (or [`WalletSession::next`]) to react to wallet events and call
/// [`Teardown::teardown`] when the owning UI goes away.
pub struct WalletSession<W: WalletProvider> {
    wallet: Option<Rc<W>>,
    config: Rc<SessionConfig>,
    state: Rc<RefCell<ConnectionState<W::Client>>>,
    sender: UnboundedSender<Message>,
    receiver: Rc<Mutex<UnboundedReceiver<Message>>>,
    closed: Rc<Cell<bool>>,
    listener: Option<Listener>,
    reload: Rc<dyn Fn()>,
}

impl<W: WalletProvider> Clone for WalletSession<W> {
    fn clone(&self) -> Self {
        Self {
            wallet: self.wallet.clone(),
            config: self.config.clone(),
            state: self.state.clone(),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            closed: self.closed.clone(),
            listener: self.listener.clone(),
            reload: self.reload.clone(),
        }
    }
}

impl<W: WalletProvider> Debug for WalletSession<W> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "WalletSession with wallet: {}, {:?}", self.wallet.is_some(), self.state.borrow())
    }
}

impl<W: WalletProvider> PartialEq for WalletSession<W> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

/// Returned by [`WalletSession::initialize`], releases the wallet listeners
#[derive(Debug)]
#[must_use = "dropping the teardown removes the wallet listeners"]
pub struct Teardown {
    subscription: Option<Subscription>,
    sender: UnboundedSender<Message>,
}

impl Teardown {
    /// Removes the wallet listeners and stops the event loop
    pub fn teardown(self) {
        if let Some(subscription) = self.subscription {
            subscription.release();
        }
        _ = self.sender.send(Message::Shutdown);
        debug!("Wallet session torn down");
    }
}

/// Everything a wallet card shows about the connected account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub short_address: String,
    pub balance: String,
    pub network: String,
}

impl<W: WalletProvider> WalletSession<W> {
    pub(crate) fn new(
        wallet: Option<W>,
        config: SessionConfig,
        listener: Option<Listener>,
        reload: Rc<dyn Fn()>,
    ) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            wallet: wallet.map(Rc::new),
            config: Rc::new(config),
            state: Rc::new(RefCell::new(ConnectionState::default())),
            sender,
            receiver: Rc::new(Mutex::new(receiver)),
            closed: Rc::new(Cell::new(false)),
            listener,
            reload,
        }
    }

    /// Checks if a wallet was injected into the page
    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionSnapshot {
        self.state.borrow().snapshot()
    }

    /// Lowercase hex address of the connected account, empty when disconnected
    pub fn account(&self) -> String {
        self.state().account
    }

    pub fn address(&self) -> Option<Address> {
        self.state.borrow().account()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state.borrow().chain_id()
    }

    pub fn is_connecting(&self) -> bool {
        self.state.borrow().is_connecting()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// Network client of the current connection
    pub fn provider(&self) -> Option<Rc<W::Client>> {
        self.state.borrow().provider()
    }

    /// Connected address shortened for display, empty when disconnected
    pub fn short_address(&self) -> String {
        format_address(&self.account())
    }

    /// Subscribes to wallet events and picks up an account the wallet already authorized.
    ///
    /// Never prompts the user. Without a wallet the state stays empty. Keep the returned
    /// [`Teardown`] alive for as long as wallet events should be delivered, dropping it removes
    /// the listeners.
    pub async fn initialize(&self) -> Teardown {
        let Some(wallet) = self.wallet.clone() else {
            debug!("No injected wallet found");
            return Teardown { subscription: None, sender: self.sender.clone() };
        };

        let subscription = match wallet.subscribe(self.sender.clone()) {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                error!("Cannot subscribe to wallet events {err:?}");
                None
            }
        };

        match wallet.accounts().await {
            Ok(_) if self.is_connected() || self.is_connecting() => {
                debug!("Session already connected, skipping account discovery");
            }
            Ok(accounts) => {
                if let Some(account) = accounts.first() {
                    if let Err(err) = self.adopt(*account).await {
                        error!("Error restoring connection: {err}");
                    }
                }
            }
            Err(err) => error!("Error checking connection: {err}"),
        }

        Teardown { subscription, sender: self.sender.clone() }
    }

    /// Asks the wallet for authorization and opens a network client for the approved account
    pub async fn connect(&self) -> Result<(), SessionError> {
        let Some(wallet) = self.wallet.clone() else {
            error!("Cannot connect, no wallet injected");
            return Err(SessionError::ProviderUnavailable);
        };

        {
            let mut state = self.state.borrow_mut();
            if state.is_connecting() {
                return Err(SessionError::ConnectInProgress);
            }
            if state.is_connected() {
                return Err(SessionError::AlreadyConnected);
            }
            state.set_connecting(true);
        }
        self.emit(Event::Connecting);

        let result = Self::establish(&wallet).await;

        match result {
            Ok((account, client, chain_id)) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.establish(account, client, Some(chain_id));
                    state.set_connecting(false);
                }
                debug!("Wallet connected {account:?} on chain {chain_id}");
                self.emit(Event::Connected);
                self.emit(Event::AccountChanged(Some(account)));
                self.emit(Event::ChainIdChanged(Some(chain_id)));
                Ok(())
            }
            Err(err) => {
                self.state.borrow_mut().set_connecting(false);
                error!("Error connecting wallet: {err}");
                self.emit(Event::ConnectFailed);
                if err.is_user_rejection() {
                    Err(SessionError::UserRejected)
                } else {
                    Err(SessionError::ConnectFailed(err))
                }
            }
        }
    }

    async fn establish(wallet: &W) -> Result<(Address, Rc<W::Client>, u64), WalletError> {
        let accounts = wallet.request_accounts().await?;
        let account = *accounts.first().ok_or(WalletError::NoAccounts)?;
        let client = wallet.open_client()?;
        let chain_id = client.chain_id().await?;
        Ok((account, Rc::new(client), chain_id))
    }

    /// Forgets the connection. The wallet keeps its authorization.
    pub fn disconnect(&self) {
        let policy = self.config.chain_change_policy;
        let effect = reduce(&mut *self.state.borrow_mut(), &Message::Disconnect, policy);
        debug!("Wallet disconnected ({effect:?})");
        self.emit(Event::Disconnected);
    }

    /// Asks the wallet to switch networks. State follows through the resulting `chainChanged`.
    pub async fn switch_network(&self, chain_id_hex: &str) -> Result<(), SessionError> {
        let Some(wallet) = self.wallet.clone() else {
            return Err(SessionError::ProviderUnavailable);
        };
        let Some(chain_id) = parse_chain_id(chain_id_hex) else {
            error!("Cannot switch to malformed chain id {chain_id_hex}");
            return Err(SessionError::SwitchFailed(WalletError::InvalidChainId(
                chain_id_hex.to_string(),
            )));
        };

        wallet.switch_chain(chain_id).await.map_err(|err| {
            if err.is_unrecognized_chain() {
                error!("Wallet does not know chain {chain_id_hex}");
            } else {
                error!("Error switching to chain {chain_id_hex}: {err}");
            }
            SessionError::SwitchFailed(err)
        })
    }

    /// Switches to the configured default network (Ethereum mainnet unless changed)
    pub async fn switch_to_default_network(&self) -> Result<(), SessionError> {
        self.switch_network(&format!("{:#x}", self.config.switch_target)).await
    }

    /// Balance of the connected account with four decimals, `0.0000` when it cannot be read
    pub async fn balance(&self) -> String {
        match self.lookup_balance().await {
            Ok(balance) => format_balance(balance),
            Err(SessionError::NotConnected) => format_balance(U256::zero()),
            Err(err) => {
                warn!("Error fetching balance: {err}");
                format_balance(U256::zero())
            }
        }
    }

    async fn lookup_balance(&self) -> Result<U256, SessionError> {
        let (account, client) = {
            let state = self.state.borrow();
            (state.account(), state.provider())
        };
        match (account, client) {
            (Some(account), Some(client)) => {
                client.balance(account).await.map_err(SessionError::LookupFailed)
            }
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Human readable name of the current network
    pub fn network_name(&self) -> String {
        self.config.networks.label(self.chain_id())
    }

    pub async fn wallet_info(&self) -> Option<WalletInfo> {
        if !self.is_connected() {
            return None;
        }
        let balance = self.balance().await;
        Some(WalletInfo {
            address: self.account(),
            short_address: self.short_address(),
            balance,
            network: self.network_name(),
        })
    }

    /// Waits for the next wallet message and applies it.
    ///
    /// Returns the main event the message produced, `None` once the session was torn down.
    pub async fn next(&self) -> Option<Event> {
        loop {
            if self.closed.get() {
                return None;
            }
            let message = self.receiver.lock().await.recv().await?;
            if let Some(event) = self.dispatch(message).await {
                return Some(event);
            }
        }
    }

    /// Applies wallet events until the session is torn down
    pub async fn run(&self) {
        while let Some(event) = self.next().await {
            debug!("Wallet event {event:?}");
        }
        debug!("Listener loop ended");
    }

    async fn dispatch(&self, message: Message) -> Option<Event> {
        let policy = self.config.chain_change_policy;
        let effect = reduce(&mut *self.state.borrow_mut(), &message, policy);
        debug!("Wallet message {message:?} resulted in {effect:?}");

        match effect {
            Effect::Unchanged => None,
            Effect::Cleared => Some(self.emit(Event::Disconnected)),
            Effect::AccountSwapped(account) => {
                Some(self.emit(Event::AccountChanged(Some(account))))
            }
            Effect::Adopt(account) => {
                if self.is_connecting() {
                    debug!("Connection in progress, ignoring account {account:?}");
                    return None;
                }
                match self.adopt(account).await {
                    Ok(()) => Some(Event::Connected),
                    Err(err) => {
                        error!("Cannot open a session for account {account:?}: {err}");
                        None
                    }
                }
            }
            Effect::Reload(chain_id) => {
                if self.is_connected() {
                    self.emit(Event::ChainIdChanged(Some(chain_id)));
                }
                let event = self.emit(Event::Reloading);
                (self.reload)();
                Some(event)
            }
            Effect::RebuildClient(chain_id) => Some(self.rebuild_client(chain_id)),
            Effect::Shutdown => {
                self.closed.set(true);
                self.emit(Event::Closed);
                None
            }
        }
    }

    async fn adopt(&self, account: Address) -> Result<(), WalletError> {
        let wallet = self.wallet.clone().ok_or(WalletError::Unavailable)?;
        let client = Rc::new(wallet.open_client()?);
        self.state.borrow_mut().establish(account, client.clone(), None);
        self.emit(Event::Connected);
        self.emit(Event::AccountChanged(Some(account)));

        match client.chain_id().await {
            Ok(chain_id) => {
                let current = self
                    .state
                    .borrow()
                    .provider()
                    .map_or(false, |provider| Rc::ptr_eq(&provider, &client));
                if current {
                    self.state.borrow_mut().set_chain_id(chain_id);
                    self.emit(Event::ChainIdChanged(Some(chain_id)));
                }
            }
            Err(err) => warn!("Cannot read chain id for {account:?}: {err}"),
        }
        Ok(())
    }

    fn rebuild_client(&self, chain_id: u64) -> Event {
        let opened = match &self.wallet {
            Some(wallet) => wallet.open_client(),
            None => Err(WalletError::Unavailable),
        };
        match opened {
            Ok(client) => {
                self.state.borrow_mut().replace_provider(Rc::new(client));
                self.emit(Event::ChainIdChanged(Some(chain_id)))
            }
            Err(err) => {
                error!("Cannot rebuild network client for chain {chain_id}: {err}");
                self.state.borrow_mut().clear();
                self.emit(Event::Disconnected)
            }
        }
    }

    fn emit(&self, event: Event) -> Event {
        if let Some(listener) = &self.listener {
            let snapshot = self.state.borrow().snapshot();
            listener(&event, &snapshot);
        }
        event
    }
}
