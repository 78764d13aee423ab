// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nauta_server_k8s::RunKey;
use tracing::debug;

use crate::context::CancellationToken;

struct Entry {
	id: u64,
	token: CancellationToken,
}

/// Mapping from run to the cancellation handle of its monitor task.
///
/// Holds at most one entry per run. Entries are added through
/// [`TaskRegistry::register_if_absent`] or [`TaskRegistry::register_replacing`]
/// and removed when the returned [`TaskLease`] is dropped.
#[derive(Default)]
pub struct TaskRegistry {
	entries: Mutex<HashMap<RunKey, Entry>>,
	next_id: AtomicU64,
}

impl TaskRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	fn entries(&self) -> MutexGuard<'_, HashMap<RunKey, Entry>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn lease(self: &Arc<Self>, key: RunKey) -> (TaskLease, Entry) {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let token = CancellationToken::new();
		let lease = TaskLease {
			registry: Arc::clone(self),
			key,
			id,
			token: token.clone(),
		};
		(lease, Entry { id, token })
	}

	/// Register a task for `key` unless one is already registered.
	pub fn register_if_absent(self: &Arc<Self>, key: RunKey) -> Option<TaskLease> {
		let mut entries = self.entries();
		if entries.contains_key(&key) {
			return None;
		}
		let (lease, entry) = self.lease(key.clone());
		entries.insert(key, entry);
		Some(lease)
	}

	/// Register a task for `key`, cancelling any task registered before it.
	pub fn register_replacing(self: &Arc<Self>, key: RunKey) -> TaskLease {
		let mut entries = self.entries();
		let (lease, entry) = self.lease(key.clone());
		if let Some(previous) = entries.insert(key.clone(), entry) {
			debug!(run = %key, "Replacing registered monitor task");
			previous.token.cancel();
		}
		lease
	}

	/// Signal cancellation to the task registered for `key`. The entry stays
	/// until the task exits. Returns false if nothing was registered.
	pub fn cancel(&self, key: &RunKey) -> bool {
		match self.entries().get(key) {
			Some(entry) => {
				entry.token.cancel();
				true
			}
			None => false,
		}
	}

	/// Drop the entry for `key` right away, cancelling its task.
	pub fn evict(&self, key: &RunKey) -> bool {
		match self.entries().remove(key) {
			Some(entry) => {
				entry.token.cancel();
				true
			}
			None => false,
		}
	}

	/// Cancel every registered task.
	pub fn cancel_all(&self) -> usize {
		let entries = self.entries();
		for entry in entries.values() {
			entry.token.cancel();
		}
		entries.len()
	}

	pub fn contains(&self, key: &RunKey) -> bool {
		self.entries().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries().is_empty()
	}

	pub fn keys(&self) -> Vec<RunKey> {
		let mut keys: Vec<_> = self.entries().keys().cloned().collect();
		keys.sort();
		keys
	}

	fn release(&self, key: &RunKey, id: u64) {
		let mut entries = self.entries();
		if entries.get(key).is_some_and(|entry| entry.id == id) {
			entries.remove(key);
		}
	}
}

/// Proof of registration held by a running monitor task.
///
/// Dropping the lease removes the registry entry, but only if the entry still
/// belongs to this lease.
pub struct TaskLease {
	registry: Arc<TaskRegistry>,
	key: RunKey,
	id: u64,
	token: CancellationToken,
}

impl TaskLease {
	pub fn key(&self) -> &RunKey {
		&self.key
	}

	pub fn token(&self) -> &CancellationToken {
		&self.token
	}
}

impl Drop for TaskLease {
	fn drop(&mut self) {
		self.registry.release(&self.key, self.id);
	}
}

impl std::fmt::Debug for TaskLease {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TaskLease")
			.field("key", &self.key)
			.field("id", &self.id)
			.finish()
	}
}
