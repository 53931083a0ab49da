use alloy::primitives::U256;
use proptest::prelude::*;

const MAX_TICKS: usize = 40;

/// One scripted tick: the tip the node reports and whether the cursor block has transactions.
#[derive(Debug, Clone, Copy)]
pub struct TickScript {
	pub tip: u64,
	pub has_block: bool,
	pub fails: bool,
}

prop_compose! {
	pub fn tick_script()(
		tip in 0u64..200,
		has_block in any::<bool>(),
		fails in prop::bool::weighted(0.1),
	) -> TickScript {
		TickScript { tip, has_block, fails }
	}
}

pub fn tick_scripts() -> impl Strategy<Value = Vec<TickScript>> {
	prop::collection::vec(tick_script(), 1..MAX_TICKS)
}

prop_compose! {
	pub fn address_hex()(hex in "[0-9a-fA-F]{40}") -> String {
		format!("0x{}", hex)
	}
}

pub fn u256_value() -> impl Strategy<Value = U256> {
	any::<[u8; 32]>().prop_map(U256::from_be_bytes)
}
