use crate::{
    format::format_address, provider::WalletProvider, session::WalletSession, SessionError,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// User record created for a wallet based login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIdentity {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub wallet_address: String,
    pub login_method: String,
}

impl WalletIdentity {
    pub fn for_account(account: &str) -> Self {
        Self {
            id: "web3_user".to_string(),
            username: format_address(account),
            first_name: "Web3".to_string(),
            last_name: "User".to_string(),
            role: "admin".to_string(),
            wallet_address: account.to_string(),
            login_method: "web3".to_string(),
        }
    }
}

impl<W: WalletProvider> WalletSession<W> {
    /// Logs in with the connected wallet. The wallet signature is not verified.
    pub fn login_with_wallet(&self) -> Result<WalletIdentity, SessionError> {
        if !self.is_connected() {
            error!("Please connect your wallet first");
            return Err(SessionError::NotConnected);
        }
        let identity = WalletIdentity::for_account(&self.account());
        debug!("Logged in with wallet: {}", identity.username);
        Ok(identity)
    }
}
