pub mod error;
pub(crate) mod ethereum;
pub(crate) mod request;

use crate::{
    eip1193::{error::Eip1193Error, ethereum::InjectedEthereum, request::request_args},
    event::WalletEvent,
    provider::{error::WalletError, Subscription, WalletProvider},
    state::Message,
};
use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcClient, Provider},
    types::{Address, U256},
};
use futures::channel::oneshot;
use gloo_utils::format::JsValueSerdeExt;
use log::{debug, error};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;
use wasm_bindgen::{closure::Closure, JsValue};
use wasm_bindgen_futures::spawn_local;

#[derive(Debug, Clone, Default)]
// All attributes this library needs is thread unsafe.
// But wasm itself is a single threaded... something.
// To avoid problems with Send and Sync, `window.ethereum` is
// fetched whenever it is needed
pub struct Eip1193 {}

#[cfg_attr(target_arch = "wasm32", async_trait(? Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl JsonRpcClient for Eip1193 {
    type Error = Eip1193Error;

    /// Sends the request via `window.ethereum` in Js
    async fn request<T: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: T,
    ) -> Result<R, Self::Error> {
        let (sender, receiver) = oneshot::channel();

        let args = request_args(method, &parse_params(params)?)?;

        spawn_local(async move {
            if let Ok(ethereum) = InjectedEthereum::default_opt() {
                let response = ethereum.request(args).await;
                let res = match response {
                    // `undefined` does not stringify, wallets answer it for void methods
                    Ok(r) => match js_sys::JSON::stringify(&r) {
                        Ok(r) => Ok(r.as_string().unwrap_or_else(|| "null".to_string())),
                        Err(err) => Err(err.into()),
                    },
                    Err(e) => Err(e.into()),
                };
                _ = sender.send(res);
            } else {
                _ = sender.send(Err(Eip1193Error::NotInjected));
            }
        });

        let res = receiver.await.map_err(|_| Eip1193Error::Dropped)?;
        Ok(serde_json::from_str(&res?)?)
    }
}

impl Eip1193 {
    pub fn is_available() -> bool {
        InjectedEthereum::default_opt().is_ok()
    }

    pub fn new() -> Self {
        Eip1193 {}
    }
}

fn parse_params<T: Serialize>(params: T) -> Result<JsValue, Eip1193Error> {
    let params = JsValue::from_serde(&params)?;
    if params.is_null() || params.is_undefined() {
        Ok(js_sys::Array::new().into())
    } else {
        Ok(params)
    }
}

/// Wallet injected by a browser extension at `window.ethereum`
#[derive(Debug, Clone, Default)]
pub struct InjectedWallet {
    transport: Eip1193,
}

impl InjectedWallet {
    /// Wallet of the current page, `None` when no extension injected one
    pub fn detect() -> Option<Self> {
        if Eip1193::is_available() {
            Some(Self::default())
        } else {
            debug!("window.ethereum not found");
            None
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(? Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WalletProvider for InjectedWallet {
    type Client = Provider<Eip1193>;

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.transport.request("eth_accounts", ()).await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.transport.request("eth_requestAccounts", ()).await?)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let params = [json!({ "chainId": format!("{chain_id:#x}") })];
        let _: serde_json::Value =
            self.transport.request("wallet_switchEthereumChain", params).await?;
        Ok(())
    }

    fn subscribe(&self, sink: UnboundedSender<Message>) -> Result<Subscription, WalletError> {
        let ethereum = InjectedEthereum::default_opt()?;

        let accounts_sink = sink.clone();
        let on_accounts = Closure::wrap(Box::new(move |accounts: JsValue| {
            match accounts.into_serde::<Vec<Address>>() {
                Ok(accounts) => {
                    _ = accounts_sink.send(Message::AccountsChanged(accounts));
                }
                Err(err) => error!("Cannot parse {} payload {err:?}", WalletEvent::AccountsChanged),
            }
        }) as Box<dyn FnMut(JsValue)>);

        let on_chain = Closure::wrap(Box::new(move |chain_id: JsValue| {
            match chain_id.into_serde::<U256>() {
                Ok(chain_id) => {
                    _ = sink.send(Message::ChainChanged(chain_id.low_u64()));
                }
                Err(err) => error!("Cannot parse {} payload {err:?}", WalletEvent::ChainChanged),
            }
        }) as Box<dyn FnMut(JsValue)>);

        ethereum.on(WalletEvent::AccountsChanged.as_str(), &on_accounts);
        ethereum.on(WalletEvent::ChainChanged.as_str(), &on_chain);

        Ok(Subscription::new(move || {
            ethereum.remove_listener(WalletEvent::AccountsChanged.as_str(), &on_accounts);
            ethereum.remove_listener(WalletEvent::ChainChanged.as_str(), &on_chain);
            debug!("Wallet listeners removed");
        }))
    }

    fn open_client(&self) -> Result<Self::Client, WalletError> {
        Ok(Provider::new(self.transport.clone()))
    }
}
