use ethers::providers::{JsonRpcError, ProviderError, RpcError};
use thiserror::Error;

/// Error code an EIP-1193 wallet answers with when the user declines a request
pub const USER_REJECTED_CODE: i64 = 4001;

/// Error code returned by `wallet_switchEthereumChain` for a chain the wallet does not know
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Error, Debug)]
/// Failure reported by the injected wallet or by the network client bound to it
pub enum WalletError {
    /// Thrown if no injected wallet is present in the page
    #[error("Wallet unavailable")]
    Unavailable,

    #[error("Wallet returned no authorized accounts")]
    NoAccounts,

    #[error("Invalid chain id {0}")]
    InvalidChainId(String),

    #[error("Wallet transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    /// Error object returned by the wallet itself
    Rpc(#[from] JsonRpcError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl WalletError {
    /// Error object sent by the wallet, looking through network client errors as well
    pub fn error_response(&self) -> Option<&JsonRpcError> {
        match self {
            WalletError::Rpc(e) => Some(e),
            WalletError::Provider(e) => e.as_error_response(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<i64> {
        self.error_response().map(|e| e.code)
    }

    /// The user explicitly declined the request in the wallet prompt
    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_CODE)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(UNRECOGNIZED_CHAIN_CODE)
    }
}
