use ethers::types::U256;

const WEI_PER_DISPLAY_UNIT: u64 = 100_000_000_000_000; // 10^18 / 10^4
const DISPLAY_DECIMALS: usize = 4;

/// Shortens an address for display: first 6 and last 4 characters around an ellipsis.
///
/// Empty input gives an empty string. Inputs of 10 characters or fewer are returned as they are
/// instead of repeating overlapping slices (`0x1234` stays `0x1234`, not `0x1234...1234`).
/// [`crate::WalletSession::short_address`] covers the disconnected case with an empty string.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Renders a wei amount in ether with four decimal places, rounding half up
pub fn format_balance(wei: U256) -> String {
    let unit = U256::from(WEI_PER_DISPLAY_UNIT);
    let scaled = wei.saturating_add(unit / 2) / unit;
    let scale = U256::from(10u64.pow(DISPLAY_DECIMALS as u32));
    let whole = scaled / scale;
    let fraction = (scaled % scale).low_u64();
    format!("{whole}.{fraction:0width$}", width = DISPLAY_DECIMALS)
}
