use std::collections::BTreeMap;

/// Public networks shown by name instead of by id
pub const KNOWN_NETWORKS: &[(u64, &str)] = &[
    (1, "Ethereum Mainnet"),
    (5, "Goerli Testnet"),
    (11155111, "Sepolia Testnet"),
    (137, "Polygon Mainnet"),
    (80001, "Polygon Mumbai"),
    (56, "BSC Mainnet"),
    (97, "BSC Testnet"),
];

pub const MAINNET_CHAIN_ID: u64 = 1;

/// Lookup table from chain id to a human readable network name
#[derive(Clone, Debug, PartialEq)]
pub struct Networks {
    names: BTreeMap<u64, String>,
}

impl Default for Networks {
    fn default() -> Self {
        Self {
            names: KNOWN_NETWORKS.iter().map(|(id, name)| (*id, name.to_string())).collect(),
        }
    }
}

impl Networks {
    pub fn insert(&mut self, chain_id: u64, name: &str) {
        self.names.insert(chain_id, name.to_string());
    }

    pub fn name(&self, chain_id: u64) -> Option<&str> {
        self.names.get(&chain_id).map(String::as_str)
    }

    /// Display label for a chain id, `Chain ID: <id>` when the network is unknown
    pub fn label(&self, chain_id: Option<u64>) -> String {
        match chain_id {
            Some(id) => match self.name(id) {
                Some(name) => name.to_string(),
                None => format!("Chain ID: {id}"),
            },
            None => "Unknown".to_string(),
        }
    }
}

/// Network name from the default table
pub fn network_name(chain_id: u64) -> String {
    Networks::default().label(Some(chain_id))
}

/// Parses `0x` prefixed hex or plain decimal chain ids
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let chain_id = chain_id.trim();
    match chain_id.strip_prefix("0x").or_else(|| chain_id.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => chain_id.parse().ok(),
    }
}
