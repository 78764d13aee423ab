// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use kube::runtime::watcher::Event;
use nauta_runs_core::PodPhase;
use tokio::sync::mpsc;

use crate::client::RunClient;
use crate::error::K8sError;
use crate::filter::RunFilter;
use crate::types::{Run, RunKey, RunWatchEvent, RunWatchStream};

#[derive(Default)]
struct MockState {
	runs: BTreeMap<RunKey, Run>,
	pods: HashMap<RunKey, Vec<PodPhase>>,
	last_version: u64,
	get_calls: HashMap<RunKey, usize>,
	update_calls: HashMap<RunKey, usize>,
	get_failures: HashMap<RunKey, VecDeque<K8sError>>,
	update_failures: HashMap<RunKey, VecDeque<K8sError>>,
	latency: Option<Duration>,
	watchers: Vec<(Option<String>, mpsc::UnboundedSender<RunWatchEvent>)>,
}

impl MockState {
	fn bump_version(&mut self, run: &mut Run) {
		self.last_version += 1;
		run.metadata.resource_version = Some(self.last_version.to_string());
	}

	fn broadcast(&mut self, key: &RunKey, event: impl Fn() -> RunWatchEvent) {
		self.watchers.retain(|(namespace, tx)| {
			if namespace.as_deref().is_some_and(|ns| ns != key.namespace) {
				return !tx.is_closed();
			}
			tx.send(event()).is_ok()
		});
	}
}

/// An in-memory run store implementing [`RunClient`].
///
/// Behaves like the API server for the operations the operator uses:
/// replaces are checked against `resourceVersion`, every write bumps it,
/// and watchers see `Apply`/`Delete` for each change. Failures and latency
/// can be injected per run.
#[derive(Clone, Default)]
pub struct MockRunClient {
	state: Arc<Mutex<MockState>>,
}

impl MockRunClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create or overwrite a run, as a submitter would.
	pub fn insert_run(&self, mut run: Run) -> Run {
		let key = run.key();
		let mut state = self.state.lock().unwrap();
		state.bump_version(&mut run);
		state.runs.insert(key.clone(), run.clone());
		state.broadcast(&key, || Event::Apply(run.clone()));
		run
	}

	/// Delete a run. Returns whether it existed.
	pub fn delete_run(&self, key: &RunKey) -> bool {
		let mut state = self.state.lock().unwrap();
		match state.runs.remove(key) {
			Some(run) => {
				state.broadcast(key, || Event::Delete(run.clone()));
				true
			}
			None => false,
		}
	}

	/// Change a stored run out of band, as another writer would.
	pub fn modify_run(&self, key: &RunKey, f: impl FnOnce(&mut Run)) -> Option<Run> {
		let mut state = self.state.lock().unwrap();
		let mut run = state.runs.get(key)?.clone();
		f(&mut run);
		state.bump_version(&mut run);
		state.runs.insert(key.clone(), run.clone());
		state.broadcast(key, || Event::Apply(run.clone()));
		Some(run)
	}

	pub fn run(&self, key: &RunKey) -> Option<Run> {
		self.state.lock().unwrap().runs.get(key).cloned()
	}

	pub fn set_pods(&self, key: &RunKey, pods: Vec<PodPhase>) {
		self.state.lock().unwrap().pods.insert(key.clone(), pods);
	}

	/// Fail the next reads of a run with the given errors, in order.
	pub fn fail_next_gets(&self, key: &RunKey, errors: impl IntoIterator<Item = K8sError>) {
		let mut state = self.state.lock().unwrap();
		state
			.get_failures
			.entry(key.clone())
			.or_default()
			.extend(errors);
	}

	/// Fail the next replaces of a run with the given errors, in order.
	pub fn fail_next_updates(&self, key: &RunKey, errors: impl IntoIterator<Item = K8sError>) {
		let mut state = self.state.lock().unwrap();
		state
			.update_failures
			.entry(key.clone())
			.or_default()
			.extend(errors);
	}

	/// Delay every client call by `latency`.
	pub fn set_latency(&self, latency: Duration) {
		self.state.lock().unwrap().latency = Some(latency);
	}

	/// Number of `get_run` calls for a run, failed ones included.
	pub fn get_calls(&self, key: &RunKey) -> usize {
		let state = self.state.lock().unwrap();
		state.get_calls.get(key).copied().unwrap_or(0)
	}

	/// Number of `replace_run` calls for a run, failed ones included.
	pub fn update_calls(&self, key: &RunKey) -> usize {
		let state = self.state.lock().unwrap();
		state.update_calls.get(key).copied().unwrap_or(0)
	}

	/// End every open watch stream.
	pub fn close_watches(&self) {
		self.state.lock().unwrap().watchers.clear();
	}

	async fn delay(&self) {
		let latency = self.state.lock().unwrap().latency;
		if let Some(latency) = latency {
			tokio::time::sleep(latency).await;
		}
	}
}

fn in_namespace(key: &RunKey, namespace: Option<&str>) -> bool {
	namespace.map_or(true, |ns| ns == key.namespace)
}

#[async_trait]
impl RunClient for MockRunClient {
	async fn get_run(&self, namespace: &str, name: &str) -> Result<Run, K8sError> {
		self.delay().await;
		let key = RunKey::new(namespace, name);
		let mut state = self.state.lock().unwrap();
		*state.get_calls.entry(key.clone()).or_default() += 1;
		if let Some(err) = state.get_failures.get_mut(&key).and_then(VecDeque::pop_front) {
			return Err(err);
		}
		state.runs.get(&key).cloned().ok_or(K8sError::RunNotFound {
			namespace: key.namespace,
			name: key.name,
		})
	}

	async fn replace_run(&self, run: &Run) -> Result<Run, K8sError> {
		self.delay().await;
		let key = run.key();
		let mut state = self.state.lock().unwrap();
		*state.update_calls.entry(key.clone()).or_default() += 1;
		if let Some(err) = state.update_failures.get_mut(&key).and_then(VecDeque::pop_front) {
			return Err(err);
		}

		let stored_version = match state.runs.get(&key) {
			Some(stored) => stored.metadata.resource_version.clone(),
			None => {
				return Err(K8sError::RunNotFound {
					namespace: key.namespace,
					name: key.name,
				})
			}
		};
		if run.metadata.resource_version != stored_version {
			return Err(K8sError::Conflict {
				namespace: key.namespace,
				name: key.name,
			});
		}

		let mut updated = run.clone();
		state.bump_version(&mut updated);
		state.runs.insert(key.clone(), updated.clone());
		state.broadcast(&key, || Event::Apply(updated.clone()));
		Ok(updated)
	}

	async fn list_runs(
		&self,
		namespace: Option<&str>,
		filter: &RunFilter,
	) -> Result<Vec<Run>, K8sError> {
		self.delay().await;
		let state = self.state.lock().unwrap();
		let runs = state
			.runs
			.iter()
			.filter(|(key, _)| in_namespace(key, namespace))
			.map(|(_, run)| run.clone())
			.collect();
		Ok(filter.apply(runs))
	}

	async fn list_run_pods(
		&self,
		namespace: &str,
		run_name: &str,
	) -> Result<Vec<PodPhase>, K8sError> {
		self.delay().await;
		let state = self.state.lock().unwrap();
		Ok(state
			.pods
			.get(&RunKey::new(namespace, run_name))
			.cloned()
			.unwrap_or_default())
	}

	async fn watch_runs(&self, namespace: Option<&str>) -> Result<RunWatchStream, K8sError> {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut state = self.state.lock().unwrap();

		let _ = tx.send(Event::Init);
		for (key, run) in &state.runs {
			if in_namespace(key, namespace) {
				let _ = tx.send(Event::InitApply(run.clone()));
			}
		}
		let _ = tx.send(Event::InitDone);
		state.watchers.push((namespace.map(str::to_string), tx));

		let events = stream::unfold(rx, |mut rx| async move {
			rx.recv().await.map(|event| (Ok(event), rx))
		});
		Ok(Box::pin(events))
	}
}
