use crate::{
    networks::parse_chain_id, ConnectionSnapshot, InjectedWallet, SessionError, Teardown,
    WalletIdentity, WalletSession, WalletSessionBuilder,
};
use log::{debug, error};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use yew::{
    function_component, html, platform::spawn_local, prelude::*, Children, ContextProvider, Html,
    Properties,
};
use yew_hooks::use_effect_once;

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub children: Children,
}

/// Provides [`UseWalletSession`] to every child through `use_context::<UseWalletSession>()`
#[function_component(WalletContextProvider)]
pub fn wallet_context_provider(props: &Props) -> Html {
    let wallet = use_wallet_session();

    html! {
        <ContextProvider<UseWalletSession> context={wallet}>
            {for props.children.iter()}
        </ContextProvider<UseWalletSession>>
    }
}

#[derive(Clone, Debug)]
pub struct UseWalletSession {
    pub session: WalletSession<InjectedWallet>,
    pub state: UseStateHandle<ConnectionSnapshot>,
    /// Last connect or network switch error, meant for display
    pub error: UseStateHandle<Option<String>>,
}

impl PartialEq for UseWalletSession {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && self.state == other.state && self.error == other.error
    }
}

impl UseWalletSession {
    /// Connect to the injected wallet. Disable the trigger while `is_connecting` is set.
    pub fn connect(&self) {
        let session = self.session.clone();
        let error = self.error.clone();
        spawn_local(async move {
            report(&error, session.connect().await);
        });
    }

    /// Disconnect from wallet
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub fn switch_network(&self, chain_id_hex: &str) {
        let session = self.session.clone();
        let error = self.error.clone();
        let chain_id_hex = chain_id_hex.to_string();
        spawn_local(async move {
            report(&error, session.switch_network(&chain_id_hex).await);
        });
    }

    pub fn switch_to_default_network(&self) {
        let session = self.session.clone();
        let error = self.error.clone();
        spawn_local(async move {
            report(&error, session.switch_to_default_network().await);
        });
    }

    /// Checks if injected wallet is available in current context
    pub fn has_wallet(&self) -> bool {
        self.session.has_wallet()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state.is_connecting
    }

    pub fn account(&self) -> String {
        self.state.account.clone()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state.chain_id
    }

    pub fn short_address(&self) -> String {
        self.session.short_address()
    }

    pub fn network_name(&self) -> String {
        self.session.network_name()
    }

    pub fn login_with_wallet(&self) -> Result<WalletIdentity, SessionError> {
        self.session.login_with_wallet()
    }
}

fn report(error: &UseStateHandle<Option<String>>, result: Result<(), SessionError>) {
    match result {
        Ok(()) => error.set(None),
        Err(err) => {
            error!("{err}");
            error.set(Some(err.to_string()));
        }
    }
}

#[hook]
pub fn use_wallet_session() -> UseWalletSession {
    let state = use_state(ConnectionSnapshot::default);
    let error = use_state(|| None as Option<String>);

    let session = {
        let state = state.clone();
        use_memo((), move |_| {
            let mut builder = WalletSessionBuilder::new();
            if let Some(chain_id) = option_env!("SWITCH_CHAIN_ID").and_then(parse_chain_id) {
                builder.switch_target(chain_id);
            }
            builder.on_event(move |_, snapshot| state.set(snapshot.clone()));
            builder.build_injected()
        })
    };

    {
        let session = (*session).clone();
        use_effect_once(move || {
            let teardown: Rc<RefCell<Option<Teardown>>> = Rc::default();
            let mounted = Rc::new(Cell::new(true));
            {
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
            move || {
                mounted.set(false);
                if let Some(handle) = teardown.borrow_mut().take() {
                    handle.teardown();
                }
                debug!("Wallet session provider unmounted");
            }
        });
    }

    UseWalletSession { session: (*session).clone(), state, error }
}
