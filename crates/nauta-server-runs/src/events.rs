// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use nauta_server_k8s::{Run, RunKey, RunWatchEvent};

/// Lifecycle notification for one run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
	/// A run appeared while we were watching.
	Create(RunKey),
	/// A run that existed when the watch first started.
	Resume(Run),
	/// A run was deleted.
	Delete(RunKey),
}

impl RunEvent {
	pub fn key(&self) -> RunKey {
		match self {
			RunEvent::Create(key) | RunEvent::Delete(key) => key.clone(),
			RunEvent::Resume(run) => run.key(),
		}
	}
}

/// Turns raw watch events into create/resume/delete notifications.
///
/// Keeps the set of runs seen so far: updates to a known run are dropped,
/// and runs missing from a re-list are reported as deleted. Only the first
/// listing resumes runs; a re-list after a reconnect treats unseen runs as
/// created and leaves known runs alone, so a monitor that gave up stays
/// down until the operator restarts.
#[derive(Debug, Default)]
pub struct EventTranslator {
	known: BTreeSet<RunKey>,
	relisted: Option<BTreeSet<RunKey>>,
	listed: bool,
}

impl EventTranslator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn translate(&mut self, event: RunWatchEvent) -> Vec<RunEvent> {
		match event {
			RunWatchEvent::Init => {
				self.relisted = Some(BTreeSet::new());
				Vec::new()
			}
			RunWatchEvent::InitApply(run) => {
				let key = run.key();
				self.relisted.get_or_insert_with(BTreeSet::new).insert(key.clone());
				let unseen = self.known.insert(key.clone());
				if !self.listed {
					vec![RunEvent::Resume(run)]
				} else if unseen {
					vec![RunEvent::Create(key)]
				} else {
					Vec::new()
				}
			}
			RunWatchEvent::InitDone => {
				self.listed = true;
				let listed = self.relisted.take().unwrap_or_default();
				let gone = std::mem::replace(&mut self.known, listed);
				gone.into_iter()
					.filter(|key| !self.known.contains(key))
					.map(RunEvent::Delete)
					.collect()
			}
			RunWatchEvent::Apply(run) => {
				let key = run.key();
				if self.known.insert(key.clone()) {
					vec![RunEvent::Create(key)]
				} else {
					Vec::new()
				}
			}
			RunWatchEvent::Delete(run) => {
				let key = run.key();
				self.known.remove(&key);
				vec![RunEvent::Delete(key)]
			}
		}
	}

	pub fn known(&self) -> usize {
		self.known.len()
	}
}
