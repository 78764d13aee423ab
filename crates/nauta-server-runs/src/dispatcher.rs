// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use nauta_server_k8s::{Run, RunClient, RunKey, RunWatchStream};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::context::CancellationToken;
use crate::events::{EventTranslator, RunEvent};
use crate::monitor::{MonitorExit, MonitorSettings, RunMonitor};
use crate::registry::{TaskLease, TaskRegistry};

/// Reacts to run lifecycle events by starting and stopping monitor tasks,
/// keeping at most one task per run.
pub struct EventDispatcher {
	client: Arc<dyn RunClient>,
	registry: Arc<TaskRegistry>,
	settings: MonitorSettings,
	tasks: Mutex<JoinSet<MonitorExit>>,
}

impl EventDispatcher {
	pub fn new(client: Arc<dyn RunClient>, settings: MonitorSettings) -> Self {
		Self {
			client,
			registry: Arc::new(TaskRegistry::new()),
			settings,
			tasks: Mutex::new(JoinSet::new()),
		}
	}

	pub fn registry(&self) -> &Arc<TaskRegistry> {
		&self.registry
	}

	fn tasks(&self) -> MutexGuard<'_, JoinSet<MonitorExit>> {
		self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn spawn_monitor(&self, lease: TaskLease) {
		let monitor = RunMonitor::new(Arc::clone(&self.client), self.settings.clone(), lease);
		let mut tasks = self.tasks();
		while tasks.try_join_next().is_some() {}
		tasks.spawn(monitor.run());
	}

	/// A new run appeared: always start a monitor for it.
	#[instrument(skip_all, fields(run = %key))]
	pub fn on_create(&self, key: RunKey) {
		let lease = self.registry.register_replacing(key);
		debug!("Starting monitor for new run");
		self.spawn_monitor(lease);
	}

	/// A run that existed before the watch started: re-attach a monitor
	/// unless it is finished or already monitored.
	#[instrument(skip_all, fields(run = %run.key()))]
	pub fn on_resume(&self, run: &Run) {
		let key = run.key();
		let state = match run.state() {
			Ok(state) => state,
			Err(e) => {
				warn!(error = %e, "Not resuming run with invalid state");
				return;
			}
		};

		if state.is_final() {
			if self.registry.evict(&key) {
				debug!(state = %state, "Dropped stale monitor for finished run");
			}
			return;
		}

		match self.registry.register_if_absent(key) {
			Some(lease) => {
				info!(state = %state, "Resuming monitor for run");
				self.spawn_monitor(lease);
			}
			None => debug!("Run already monitored"),
		}
	}

	/// A run was deleted: signal its monitor to stop. Returns whether a
	/// monitor was registered.
	#[instrument(skip_all, fields(run = %key))]
	pub fn on_delete(&self, key: &RunKey) -> bool {
		let cancelled = self.registry.cancel(key);
		if cancelled {
			debug!("Cancelled monitor for deleted run");
		}
		cancelled
	}

	pub fn handle(&self, event: RunEvent) {
		match event {
			RunEvent::Create(key) => self.on_create(key),
			RunEvent::Resume(run) => self.on_resume(&run),
			RunEvent::Delete(key) => {
				self.on_delete(&key);
			}
		}
	}

	/// Dispatch watch events until the stream ends or `shutdown` fires.
	///
	/// Watch errors are logged; the stream is expected to recover on its own.
	#[instrument(skip_all)]
	pub async fn run(&self, mut events: RunWatchStream, shutdown: CancellationToken) {
		let mut translator = EventTranslator::new();
		info!("Dispatching run events");

		loop {
			let event = tokio::select! {
				biased;
				_ = shutdown.cancelled() => break,
				event = events.next() => event,
			};

			match event {
				Some(Ok(event)) => {
					for run_event in translator.translate(event) {
						self.handle(run_event);
					}
				}
				Some(Err(e)) => warn!(error = %e, "Run watch error"),
				None => {
					warn!("Run watch stream ended");
					break;
				}
			}
		}
	}

	/// Cancel every monitor and wait for all of them to exit.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let cancelled = self.registry.cancel_all();
		let mut tasks = std::mem::take(&mut *self.tasks());
		while tasks.join_next().await.is_some() {}
		info!(cancelled, "Run dispatcher shut down");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use nauta_runs_core::{parse_timestamp, PodPhase, RunState};
	use nauta_server_k8s::{K8sError, MockRunClient, RunSpec, RunWatchEvent};
	use std::time::Duration;
	use tokio::time::sleep;

	fn run_in(state: Option<&str>, name: &str) -> Run {
		Run::named(
			"ns",
			name,
			RunSpec {
				state: state.map(str::to_string),
				..Default::default()
			},
		)
	}

	fn setup() -> (MockRunClient, EventDispatcher) {
		let client = MockRunClient::new();
		let dispatcher = EventDispatcher::new(Arc::new(client.clone()), MonitorSettings::default());
		(client, dispatcher)
	}

	#[tokio::test(start_paused = true)]
	async fn queued_run_starts_when_pods_run() {
		let (client, dispatcher) = setup();
		let key = client.insert_run(run_in(Some("QUEUED"), "r1")).key();
		client.set_pods(&key, vec![PodPhase::Pending]);

		dispatcher.on_create(key.clone());
		sleep(Duration::from_millis(1500)).await;
		let run = client.run(&key).unwrap();
		assert_eq!(run.state().unwrap(), RunState::Queued);
		assert!(run.spec.start_time.is_none());

		client.set_pods(&key, vec![PodPhase::Running]);
		let before = Utc::now();
		sleep(Duration::from_secs(1)).await;

		let run = client.run(&key).unwrap();
		assert_eq!(run.state().unwrap(), RunState::Running);
		let start = parse_timestamp(run.spec.start_time.as_deref().unwrap()).unwrap();
		assert!(start.timestamp() >= before.timestamp() - 1);
		assert!(dispatcher.registry().contains(&key));
	}

	#[tokio::test(start_paused = true)]
	async fn completed_run_deregisters_and_stops_updating() {
		let (client, dispatcher) = setup();
		let key = client.insert_run(run_in(Some("RUNNING"), "r1")).key();
		client.set_pods(&key, vec![PodPhase::Succeeded]);

		dispatcher.on_create(key.clone());
		sleep(Duration::from_millis(1500)).await;

		let run = client.run(&key).unwrap();
		assert_eq!(run.state().unwrap(), RunState::Complete);
		assert!(run.spec.end_time.is_some());
		assert!(!dispatcher.registry().contains(&key));

		sleep(Duration::from_secs(5)).await;
		assert_eq!(client.update_calls(&key), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn delete_mid_poll_stops_updates() {
		let (client, dispatcher) = setup();
		let key = client.insert_run(run_in(Some("RUNNING"), "r2")).key();
		client.set_pods(&key, vec![PodPhase::Succeeded]);
		client.set_latency(Duration::from_millis(400));

		dispatcher.on_create(key.clone());
		sleep(Duration::from_millis(1200)).await;
		client.delete_run(&key);
		assert!(dispatcher.on_delete(&key));

		sleep(Duration::from_secs(1)).await;
		assert!(!dispatcher.registry().contains(&key));
		assert_eq!(client.update_calls(&key), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn resume_reattaches_after_restart() {
		let (client, dispatcher) = setup();
		let run = client.insert_run(run_in(Some("RUNNING"), "r3"));
		let key = run.key();
		client.set_pods(&key, vec![PodPhase::Running]);

		dispatcher.on_resume(&run);
		assert!(dispatcher.registry().contains(&key));

		sleep(Duration::from_millis(2500)).await;
		assert_eq!(client.run(&key).unwrap().state().unwrap(), RunState::Running);

		client.set_pods(&key, vec![PodPhase::Succeeded]);
		sleep(Duration::from_secs(1)).await;
		assert_eq!(client.run(&key).unwrap().state().unwrap(), RunState::Complete);
		assert!(dispatcher.registry().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn create_then_resume_runs_one_task() {
		let (client, dispatcher) = setup();
		let run = client.insert_run(run_in(Some("RUNNING"), "r1"));
		let key = run.key();
		client.set_pods(&key, vec![PodPhase::Running]);

		dispatcher.on_create(key.clone());
		dispatcher.on_resume(&run);
		assert_eq!(dispatcher.registry().len(), 1);

		sleep(Duration::from_millis(1500)).await;
		assert_eq!(client.get_calls(&key), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn repeated_create_replaces_the_task() {
		let (client, dispatcher) = setup();
		let key = client.insert_run(run_in(Some("RUNNING"), "r1")).key();
		client.set_pods(&key, vec![PodPhase::Running]);

		dispatcher.on_create(key.clone());
		dispatcher.on_create(key.clone());
		sleep(Duration::from_millis(1500)).await;

		assert_eq!(dispatcher.registry().len(), 1);
		assert_eq!(client.get_calls(&key), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn resume_skips_final_and_invalid_runs() {
		let (client, dispatcher) = setup();
		let done = client.insert_run(run_in(Some("COMPLETE"), "done"));
		let bogus = client.insert_run(run_in(Some("PAUSED"), "bogus"));

		dispatcher.on_resume(&done);
		dispatcher.on_resume(&bogus);

		assert!(dispatcher.registry().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn resume_of_finished_run_evicts_stale_entry() {
		let (client, dispatcher) = setup();
		let run = client.insert_run(run_in(Some("RUNNING"), "r1"));
		let key = run.key();
		client.set_pods(&key, vec![PodPhase::Running]);
		dispatcher.on_create(key.clone());

		let finished = client
			.modify_run(&key, |r| r.set_state(RunState::Failed))
			.unwrap();
		dispatcher.on_resume(&finished);

		assert!(!dispatcher.registry().contains(&key));
	}

	#[tokio::test(start_paused = true)]
	async fn delete_twice_is_a_no_op() {
		let (client, dispatcher) = setup();
		let key = client.insert_run(run_in(Some("QUEUED"), "r1")).key();

		dispatcher.on_create(key.clone());
		assert!(dispatcher.on_delete(&key));
		sleep(Duration::from_millis(10)).await;

		assert!(!dispatcher.on_delete(&key));
		assert!(dispatcher.registry().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn watch_loop_dispatches_events() {
		let (client, dispatcher) = setup();
		let existing = client.insert_run(run_in(Some("RUNNING"), "existing")).key();
		client.set_pods(&existing, vec![PodPhase::Running]);

		let dispatcher = Arc::new(dispatcher);
		let shutdown = CancellationToken::new();
		let events = client.watch_runs(None).await.unwrap();
		let handle = tokio::spawn({
			let dispatcher = Arc::clone(&dispatcher);
			let shutdown = shutdown.clone();
			async move { dispatcher.run(events, shutdown).await }
		});

		sleep(Duration::from_millis(100)).await;
		assert!(dispatcher.registry().contains(&existing));

		let created = client.insert_run(run_in(None, "new")).key();
		sleep(Duration::from_millis(100)).await;
		assert!(dispatcher.registry().contains(&created));

		client.delete_run(&existing);
		sleep(Duration::from_millis(100)).await;
		assert!(!dispatcher.registry().contains(&existing));

		shutdown.cancel();
		handle.await.unwrap();
		dispatcher.shutdown().await;
		assert!(dispatcher.registry().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn relist_does_not_restart_a_monitor_that_gave_up() {
		let (client, dispatcher) = setup();
		let listed = client.insert_run(run_in(Some("RUNNING"), "r1"));
		let key = listed.key();
		client.set_pods(&key, vec![PodPhase::Running]);

		let dispatcher = Arc::new(dispatcher);
		let shutdown = CancellationToken::new();
		let (tx, rx) = futures::channel::mpsc::unbounded::<Result<RunWatchEvent, K8sError>>();
		let events: RunWatchStream = Box::pin(rx);
		let handle = tokio::spawn({
			let dispatcher = Arc::clone(&dispatcher);
			let shutdown = shutdown.clone();
			async move { dispatcher.run(events, shutdown).await }
		});
		let send_listing = |run: &Run| {
			tx.unbounded_send(Ok(RunWatchEvent::Init)).unwrap();
			tx.unbounded_send(Ok(RunWatchEvent::InitApply(run.clone()))).unwrap();
			tx.unbounded_send(Ok(RunWatchEvent::InitDone)).unwrap();
		};

		send_listing(&listed);
		sleep(Duration::from_millis(100)).await;
		assert!(dispatcher.registry().contains(&key));

		client.fail_next_gets(&key, (0..5).map(|_| K8sError::Timeout));
		sleep(Duration::from_millis(5500)).await;
		assert!(!dispatcher.registry().contains(&key));
		let gets = client.get_calls(&key);

		send_listing(&listed);
		sleep(Duration::from_secs(2)).await;
		assert!(!dispatcher.registry().contains(&key));
		assert_eq!(client.get_calls(&key), gets);

		shutdown.cancel();
		handle.await.unwrap();
		dispatcher.shutdown().await;
	}

	#[tokio::test(start_paused = true)]
	async fn shutdown_waits_for_every_monitor() {
		let (client, dispatcher) = setup();
		for name in ["a", "b", "c"] {
			let key = client.insert_run(run_in(Some("RUNNING"), name)).key();
			client.set_pods(&key, vec![PodPhase::Running]);
			dispatcher.on_create(key);
		}
		assert_eq!(dispatcher.registry().len(), 3);

		dispatcher.shutdown().await;
		assert!(dispatcher.registry().is_empty());
	}
}
