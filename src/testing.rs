use crate::{
    provider::{error::WalletError, Subscription, WalletProvider},
    state::Message,
};
use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcError, MockProvider, Provider},
    types::{Address, U256},
};
use futures::channel::oneshot;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone)]
enum Reply {
    Accounts(Vec<Address>),
    Error(i64),
}

struct Script {
    authorized: Mutex<Reply>,
    approval: Mutex<Reply>,
    gate: Mutex<Option<oneshot::Receiver<Vec<Address>>>>,
    switch_error: Mutex<Option<i64>>,
    switches: Mutex<Vec<u64>>,
    sink: Arc<Mutex<Option<UnboundedSender<Message>>>>,
    released: Arc<AtomicBool>,
    prompts: AtomicUsize,
    opened: AtomicUsize,
    client: Provider<MockProvider>,
    mock: MockProvider,
}

/// Wallet double answering from a script. Clones share the script.
#[derive(Clone)]
pub(crate) struct ScriptedWallet {
    script: Arc<Script>,
}

pub(crate) fn rpc_error(code: i64) -> WalletError {
    WalletError::Rpc(JsonRpcError { code, message: format!("wallet error {code}"), data: None })
}

fn reply(reply: &Mutex<Reply>) -> Result<Vec<Address>, WalletError> {
    match &*reply.lock().unwrap() {
        Reply::Accounts(accounts) => Ok(accounts.clone()),
        Reply::Error(code) => Err(rpc_error(*code)),
    }
}

impl ScriptedWallet {
    pub fn new() -> Self {
        let (client, mock) = Provider::mocked();
        Self {
            script: Arc::new(Script {
                authorized: Mutex::new(Reply::Accounts(vec![])),
                approval: Mutex::new(Reply::Accounts(vec![])),
                gate: Mutex::new(None),
                switch_error: Mutex::new(None),
                switches: Mutex::new(vec![]),
                sink: Arc::new(Mutex::new(None)),
                released: Arc::new(AtomicBool::new(false)),
                prompts: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
                client,
                mock,
            }),
        }
    }

    /// Accounts already authorized before the page loaded
    pub fn authorize(&self, accounts: Vec<Address>) -> &Self {
        *self.script.authorized.lock().unwrap() = Reply::Accounts(accounts);
        self
    }

    pub fn fail_accounts(&self, code: i64) -> &Self {
        *self.script.authorized.lock().unwrap() = Reply::Error(code);
        self
    }

    /// Accounts the user approves in the prompt
    pub fn approve(&self, accounts: Vec<Address>) -> &Self {
        *self.script.approval.lock().unwrap() = Reply::Accounts(accounts);
        self
    }

    pub fn reject(&self, code: i64) -> &Self {
        *self.script.approval.lock().unwrap() = Reply::Error(code);
        self
    }

    /// Holds the next prompt open until the returned sender answers it
    pub fn hold_prompt(&self) -> oneshot::Sender<Vec<Address>> {
        let (sender, receiver) = oneshot::channel();
        *self.script.gate.lock().unwrap() = Some(receiver);
        sender
    }

    pub fn fail_switch(&self, code: i64) -> &Self {
        *self.script.switch_error.lock().unwrap() = Some(code);
        self
    }

    pub fn push_chain_id(&self, chain_id: u64) -> &Self {
        self.script.mock.push::<U256, _>(U256::from(chain_id)).unwrap();
        self
    }

    pub fn push_balance(&self, wei: U256) -> &Self {
        self.script.mock.push::<U256, _>(wei).unwrap();
        self
    }

    /// Delivers a wallet event to the subscribed session
    pub fn emit(&self, message: Message) {
        let sink = self.script.sink.lock().unwrap();
        sink.as_ref().expect("session is not subscribed").send(message).unwrap();
    }

    pub fn is_subscribed(&self) -> bool {
        self.script.sink.lock().unwrap().is_some()
    }

    pub fn released(&self) -> bool {
        self.script.released.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> usize {
        self.script.prompts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.script.opened.load(Ordering::SeqCst)
    }

    pub fn switches(&self) -> Vec<u64> {
        self.script.switches.lock().unwrap().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WalletProvider for ScriptedWallet {
    type Client = Provider<MockProvider>;

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        reply(&self.script.authorized)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.script.prompts.fetch_add(1, Ordering::SeqCst);
        let gate = self.script.gate.lock().unwrap().take();
        match gate {
            Some(gate) => gate.await.map_err(|_| WalletError::Transport("prompt dropped".into())),
            None => reply(&self.script.approval),
        }
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.script.switches.lock().unwrap().push(chain_id);
        let code = *self.script.switch_error.lock().unwrap();
        match code {
            Some(code) => Err(rpc_error(code)),
            None => Ok(()),
        }
    }

    fn subscribe(&self, sink: UnboundedSender<Message>) -> Result<Subscription, WalletError> {
        *self.script.sink.lock().unwrap() = Some(sink);
        let slot = self.script.sink.clone();
        let released = self.script.released.clone();
        Ok(Subscription::new(move || {
            slot.lock().unwrap().take();
            released.store(true, Ordering::SeqCst);
        }))
    }

    fn open_client(&self) -> Result<Self::Client, WalletError> {
        self.script.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.script.client.clone())
    }
}
