use crate::config::{COIN, COIN_DECIMALS};

pub fn format_token_amount(amount: u64, decimals: u32) -> String {
	let scale = 10u64.pow(decimals);
	if decimals == 0 {
		return amount.to_string();
	}
	format!(
		"{}.{:0width$}",
		amount / scale,
		amount % scale,
		width = decimals as usize
	)
}

/// Formats satoshis as whole coins with all decimals.
pub fn format_coin_amount(sats: u64) -> String {
	debug_assert_eq!(10u64.pow(COIN_DECIMALS), COIN);
	format_token_amount(sats, COIN_DECIMALS)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_coin_amount() {
		assert_eq!(format_coin_amount(500_000_000), "5.00000000");
		assert_eq!(format_coin_amount(1), "0.00000001");
		assert_eq!(format_token_amount(1_234_567, 6), "1.234567");
		assert_eq!(format_token_amount(42, 0), "42");
	}
}
