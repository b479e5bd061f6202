use crate::{
    networks::parse_chain_id, ConnectionSnapshot, InjectedWallet, SessionError, Teardown,
    WalletIdentity, WalletSession, WalletSessionBuilder,
};
use leptos::*;
use log::{debug, error};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Main component for wallet connections. Define it as your website root to get the access
/// to connection state and actions `use_context::<WalletSessionContext>()`
#[component]
pub fn WalletSessionRoot(children: Children) -> impl IntoView {
    debug!("Creating new wallet session root");

    provide_context(WalletSessionContext::new());

    children()
}

/// Wallet session context for your website
#[derive(Clone, Debug)]
pub struct WalletSessionContext {
    session: WalletSession<InjectedWallet>,
    state: ReadSignal<ConnectionSnapshot>,
    error: RwSignal<Option<String>>,
}

impl WalletSessionContext {
    pub(crate) fn new() -> Self {
        let (state, set_state) = create_signal(ConnectionSnapshot::default());
        let error = create_rw_signal(None);

        let mut builder = WalletSessionBuilder::new();
        if let Some(chain_id) = option_env!("SWITCH_CHAIN_ID").and_then(parse_chain_id) {
            builder.switch_target(chain_id);
        }
        builder.on_event(move |_, snapshot| set_state.set(snapshot.clone()));
        let session = builder.build_injected();

        let teardown: Rc<RefCell<Option<Teardown>>> = Rc::default();
        let mounted = Rc::new(Cell::new(true));
        {
            let session = session.clone();
            let teardown = teardown.clone();
            let mounted = mounted.clone();
            spawn_local(async move {
                let handle = session.initialize().await;
                if !mounted.get() {
                    handle.teardown();
                    return;
                }
                *teardown.borrow_mut() = Some(handle);
                session.run().await;
            });
        }
        on_cleanup(move || {
            mounted.set(false);
            if let Some(handle) = teardown.borrow_mut().take() {
                handle.teardown();
            }
        });

        Self { session, state, error }
    }

    /// Connect to the injected wallet
    pub fn connect(&self) {
        let session = self.session.clone();
        let error = self.error;
        spawn_local(async move {
            report(error, session.connect().await);
        });
    }

    /// Disconnect from wallet
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub fn switch_network(&self, chain_id_hex: &str) {
        let session = self.session.clone();
        let error = self.error;
        let chain_id_hex = chain_id_hex.to_string();
        spawn_local(async move {
            report(error, session.switch_network(&chain_id_hex).await);
        });
    }

    pub fn switch_to_default_network(&self) {
        let session = self.session.clone();
        let error = self.error;
        spawn_local(async move {
            report(error, session.switch_to_default_network().await);
        });
    }

    /// Connection state signal, tracked when read inside views
    pub fn state(&self) -> ReadSignal<ConnectionSnapshot> {
        self.state
    }

    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state.get().is_connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state.get().is_connecting
    }

    pub fn account(&self) -> String {
        self.state.get().account
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state.get().chain_id
    }

    pub fn short_address(&self) -> String {
        crate::format_address(&self.account())
    }

    pub fn network_name(&self) -> String {
        self.session.config().networks.label(self.chain_id())
    }

    pub fn login_with_wallet(&self) -> Result<WalletIdentity, SessionError> {
        self.session.login_with_wallet()
    }

    /// Session handle for balance lookups and anything not mirrored in signals
    pub fn session(&self) -> WalletSession<InjectedWallet> {
        self.session.clone()
    }
}

fn report(error: RwSignal<Option<String>>, result: Result<(), SessionError>) {
    match result {
        Ok(()) => error.set(None),
        Err(err) => {
            error!("{err}");
            error.set(Some(err.to_string()));
        }
    }
}
