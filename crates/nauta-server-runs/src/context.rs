// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct TokenState {
	cancelled: AtomicBool,
	notify: Notify,
}

/// Cooperative cancellation signal shared between a monitor task and
/// whoever may stop it.
#[derive(Clone)]
pub struct CancellationToken {
	state: Arc<TokenState>,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self {
			state: Arc::new(TokenState {
				cancelled: AtomicBool::new(false),
				notify: Notify::new(),
			}),
		}
	}

	pub fn cancel(&self) {
		self.state.cancelled.store(true, Ordering::SeqCst);
		self.state.notify.notify_waiters();
	}

	pub fn is_cancelled(&self) -> bool {
		self.state.cancelled.load(Ordering::SeqCst)
	}

	/// Resolves once [`cancel`](Self::cancel) has been called.
	pub async fn cancelled(&self) {
		loop {
			let notified = self.state.notify.notified();
			if self.is_cancelled() {
				return;
			}
			notified.await;
		}
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for CancellationToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CancellationToken")
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}
