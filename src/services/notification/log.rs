use async_trait::async_trait;
use tracing::info;

use crate::models::{MonitorCallback, MonitorMatch};

/// Writes every match to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCallback;

#[async_trait]
impl MonitorCallback for LogCallback {
	async fn on_match(&self, matched: &MonitorMatch) -> Result<(), anyhow::Error> {
		let tx = &matched.transaction;
		info!(
			rule = %matched.rule,
			height = tx.block_height,
			hash = tx.hash.as_deref().unwrap_or("-"),
			from = tx.from.as_deref().unwrap_or("-"),
			to = tx.to.as_deref().unwrap_or("-"),
			value = %tx.value,
			"Monitor matched"
		);
		Ok(())
	}
}
