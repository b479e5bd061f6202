use crate::provider::error::WalletError;
use ethers::prelude::{JsonRpcError, ProviderError, RpcError};
use gloo_utils::format::JsValueSerdeExt;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure of a single `window.ethereum` call
#[derive(Error, Debug)]
pub enum Eip1193Error {
    /// Rejected with something that is not a JSON-RPC error object
    #[error("Wallet threw {0}")]
    Thrown(String),

    #[error("window.ethereum is not injected")]
    NotInjected,

    /// Error object returned by the wallet, carries the EIP-1193 code
    #[error(transparent)]
    Rpc(#[from] JsonRpcError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// The page task answering the request went away
    #[error("Wallet request was dropped")]
    Dropped,
}

impl RpcError for Eip1193Error {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Eip1193Error::Rpc(e) => Some(e),
            _ => None,
        }
    }

    fn is_error_response(&self) -> bool {
        self.as_error_response().is_some()
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Eip1193Error::SerdeJson(e) => Some(e),
            _ => None,
        }
    }

    fn is_serde_error(&self) -> bool {
        self.as_serde_error().is_some()
    }
}

impl From<JsValue> for Eip1193Error {
    fn from(thrown: JsValue) -> Self {
        match thrown.into_serde::<JsonRpcError>() {
            Ok(rpc) => Eip1193Error::Rpc(rpc),
            Err(_) => Eip1193Error::Thrown(format!("{thrown:?}")),
        }
    }
}

impl From<Eip1193Error> for ProviderError {
    fn from(src: Eip1193Error) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

impl From<Eip1193Error> for WalletError {
    fn from(src: Eip1193Error) -> Self {
        match src {
            Eip1193Error::Rpc(e) => WalletError::Rpc(e),
            Eip1193Error::NotInjected => WalletError::Unavailable,
            Eip1193Error::SerdeJson(e) => WalletError::SerdeJson(e),
            other => WalletError::Transport(other.to_string()),
        }
    }
}
