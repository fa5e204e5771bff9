//! New-block notifications.
//!
//! The watcher polls the chain head and emits every block number it has not
//! emitted before, in ascending order. When the head jumps by several blocks
//! between polls, each skipped block is emitted too.

use crate::{ChainError, ChainService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Item delivered by the watcher: a new block number, or the error that
/// stopped the watcher.
pub type BlockEvent = Result<u64, ChainError>;

/// Handle to a running block watcher. The polling task stops when the handle
/// is stopped or dropped, or when the receiving side goes away.
pub struct BlockWatcher {
	stop_tx: Option<mpsc::Sender<()>>,
	task: JoinHandle<()>,
}

impl BlockWatcher {
	/// Starts polling. Blocks after `last_seen` are reported on `sender`.
	pub fn spawn(
		chain: Arc<ChainService>,
		last_seen: u64,
		poll_interval: Duration,
		sender: mpsc::UnboundedSender<BlockEvent>,
	) -> Self {
		let (stop_tx, stop_rx) = mpsc::channel(1);
		let task = tokio::spawn(Self::poll_loop(
			chain,
			last_seen,
			poll_interval,
			sender,
			stop_rx,
		));

		Self {
			stop_tx: Some(stop_tx),
			task,
		}
	}

	/// Signals the polling task to exit.
	pub async fn stop(&mut self) {
		if let Some(stop_tx) = self.stop_tx.take() {
			let _ = stop_tx.send(()).await;
		}
	}

	async fn poll_loop(
		chain: Arc<ChainService>,
		mut last_seen: u64,
		poll_interval: Duration,
		sender: mpsc::UnboundedSender<BlockEvent>,
		mut stop_rx: mpsc::Receiver<()>,
	) {
		let mut interval = tokio::time::interval(poll_interval);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

		loop {
			tokio::select! {
				_ = interval.tick() => {
					let head = match chain.get_block_number().await {
						Ok(head) => head,
						Err(e) => {
							tracing::error!(error = %e, "Block watcher giving up");
							let _ = sender.send(Err(e));
							return;
						}
					};

					while last_seen < head {
						last_seen += 1;
						tracing::trace!(block = last_seen, "New block");
						if sender.send(Ok(last_seen)).is_err() {
							return;
						}
					}
				}
				_ = stop_rx.recv() => {
					tracing::debug!("Block watcher stopped");
					return;
				}
			}
		}
	}
}

impl Drop for BlockWatcher {
	fn drop(&mut self) {
		self.task.abort();
	}
}
