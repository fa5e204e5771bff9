//! Retry requests and the queue feeding the worker.

use std::collections::VecDeque;

/// What produced a retry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryTrigger {
	/// The first submission, right after the sale opened.
	Initial,
	/// A new block was observed.
	NewBlock,
}

/// One submission attempt, aimed at the block after `observed_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryRequest {
	pub observed_block: u64,
	pub trigger: RetryTrigger,
}

impl RetryRequest {
	pub fn initial(observed_block: u64) -> Self {
		Self {
			observed_block,
			trigger: RetryTrigger::Initial,
		}
	}

	pub fn new_block(observed_block: u64) -> Self {
		Self {
			observed_block,
			trigger: RetryTrigger::NewBlock,
		}
	}

	/// Block the bundle is valid for.
	pub fn target_block(&self) -> u64 {
		self.observed_block + 1
	}
}

/// Pending retry requests, oldest first.
///
/// With supersession enabled, taking a request discards everything queued
/// before the newest one: a bundle for an already-mined block can only fail.
#[derive(Debug)]
pub struct RetryQueue {
	pending: VecDeque<RetryRequest>,
	supersede_stale: bool,
}

impl RetryQueue {
	pub fn new(supersede_stale: bool) -> Self {
		Self {
			pending: VecDeque::new(),
			supersede_stale,
		}
	}

	pub fn push(&mut self, request: RetryRequest) {
		self.pending.push_back(request);
	}

	pub fn next(&mut self) -> Option<RetryRequest> {
		if !self.supersede_stale {
			return self.pending.pop_front();
		}

		let latest = self.pending.pop_back()?;
		if !self.pending.is_empty() {
			tracing::debug!(
				skipped = self.pending.len(),
				block = latest.observed_block,
				"Superseded stale retry requests"
			);
			self.pending.clear();
		}
		Some(latest)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_target_is_next_block() {
		assert_eq!(RetryRequest::initial(100).target_block(), 101);
		assert_eq!(RetryRequest::new_block(7).target_block(), 8);
	}

	#[test]
	fn test_fifo_without_supersession() {
		let mut queue = RetryQueue::new(false);
		queue.push(RetryRequest::initial(10));
		queue.push(RetryRequest::new_block(11));
		queue.push(RetryRequest::new_block(12));

		assert_eq!(queue.next(), Some(RetryRequest::initial(10)));
		assert_eq!(queue.next(), Some(RetryRequest::new_block(11)));
		assert_eq!(queue.next(), Some(RetryRequest::new_block(12)));
		assert_eq!(queue.next(), None);
	}

	#[test]
	fn test_supersession_keeps_newest() {
		let mut queue = RetryQueue::new(true);
		queue.push(RetryRequest::new_block(11));
		queue.push(RetryRequest::new_block(12));
		queue.push(RetryRequest::new_block(13));

		assert_eq!(queue.next(), Some(RetryRequest::new_block(13)));
		assert_eq!(queue.next(), None);

		queue.push(RetryRequest::new_block(14));
		assert_eq!(queue.next(), Some(RetryRequest::new_block(14)));
	}
}
