// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nauta_runs_core::{stamp_transition, RunState};
use nauta_server_k8s::{K8sError, RunClient, RunKey};
use tracing::{debug, error, info, instrument, warn};

use crate::context::CancellationToken;
use crate::error::MonitorError;
use crate::registry::TaskLease;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RETRY_LIMIT: u32 = 5;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
	/// Sleep before every poll.
	pub poll_interval: Duration,
	/// Consecutive failed polls after which the monitor gives up.
	pub retry_limit: u32,
	/// Upper bound on each client call.
	pub request_timeout: Duration,
}

impl Default for MonitorSettings {
	fn default() -> Self {
		Self {
			poll_interval: DEFAULT_POLL_INTERVAL,
			retry_limit: DEFAULT_RETRY_LIMIT,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}
}

/// How a monitor task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
	/// The run is in this final state.
	Finished(RunState),
	/// Cancellation was signalled.
	Cancelled,
	/// The run no longer exists.
	Vanished,
	/// The persisted state is not one we know.
	InvalidState,
	/// Too many consecutive failed polls. The run keeps its last persisted
	/// state until a monitor is attached again.
	RetriesExhausted,
}

enum Poll {
	Pending,
	Done(RunState),
}

/// Drives one run to a final state by polling it.
///
/// The monitor owns the [`TaskLease`] for its run, so the registry entry goes
/// away however the monitor ends, including when its task is aborted.
pub struct RunMonitor {
	client: Arc<dyn RunClient>,
	settings: MonitorSettings,
	lease: TaskLease,
}

impl RunMonitor {
	pub fn new(client: Arc<dyn RunClient>, settings: MonitorSettings, lease: TaskLease) -> Self {
		Self {
			client,
			settings,
			lease,
		}
	}

	pub fn key(&self) -> &RunKey {
		self.lease.key()
	}

	fn token(&self) -> &CancellationToken {
		self.lease.token()
	}

	#[instrument(
		skip_all,
		fields(namespace = %self.key().namespace, run = %self.key().name)
	)]
	pub async fn run(self) -> MonitorExit {
		debug!("Monitor started");
		let exit = self.poll_until_done().await;
		match exit {
			MonitorExit::Finished(state) => info!(state = %state, "Monitor finished"),
			MonitorExit::Cancelled => info!("Monitor cancelled"),
			MonitorExit::Vanished => info!("Run no longer exists, monitor stopped"),
			MonitorExit::InvalidState | MonitorExit::RetriesExhausted => {}
		}
		exit
	}

	async fn poll_until_done(&self) -> MonitorExit {
		let mut failures = 0u32;

		loop {
			tokio::select! {
				biased;
				_ = self.token().cancelled() => return MonitorExit::Cancelled,
				_ = tokio::time::sleep(self.settings.poll_interval) => {}
			}

			match self.poll_once().await {
				Ok(Poll::Pending) => failures = 0,
				Ok(Poll::Done(state)) => return MonitorExit::Finished(state),
				Err(MonitorError::Cancelled) => return MonitorExit::Cancelled,
				Err(e) if e.is_not_found() => return MonitorExit::Vanished,
				Err(MonitorError::InvalidState(e)) => {
					error!(error = %e, "Run has an invalid state, not monitoring it");
					return MonitorExit::InvalidState;
				}
				Err(e) => {
					failures += 1;
					if failures >= self.settings.retry_limit {
						error!(
							error = %e,
							attempt = failures,
							"Giving up on run after repeated failures; it needs operator attention"
						);
						return MonitorExit::RetriesExhausted;
					}
					warn!(
						error = %e,
						attempt = failures,
						transient = e.is_transient(),
						"Run poll failed, retrying"
					);
				}
			}
		}
	}

	async fn poll_once(&self) -> Result<Poll, MonitorError> {
		let key = self.key();
		let mut run = self
			.call(self.client.get_run(&key.namespace, &key.name))
			.await?;

		let current = run.state()?;
		if current.is_final() {
			return Ok(Poll::Done(current));
		}

		let pods = self
			.call(self.client.list_run_pods(&key.namespace, &key.name))
			.await?;
		let next = run.calculate_current_state(&pods)?;
		if next == current {
			return Ok(Poll::Pending);
		}

		let mut timestamps = run.timestamps();
		stamp_transition(current, next, &mut timestamps, Utc::now());
		run.set_state(next);
		run.set_timestamps(timestamps);

		if self.token().is_cancelled() {
			return Err(MonitorError::Cancelled);
		}
		self.call(self.client.replace_run(&run)).await?;
		info!(from = %current, to = %next, "Run changed state");

		Ok(if next.is_final() {
			Poll::Done(next)
		} else {
			Poll::Pending
		})
	}

	/// Run a client call bounded by the request timeout, giving up early on
	/// cancellation.
	async fn call<T>(
		&self,
		request: impl Future<Output = Result<T, K8sError>>,
	) -> Result<T, MonitorError> {
		tokio::select! {
			biased;
			_ = self.token().cancelled() => Err(MonitorError::Cancelled),
			result = tokio::time::timeout(self.settings.request_timeout, request) => match result {
				Ok(response) => Ok(response?),
				Err(_) => Err(K8sError::Timeout.into()),
			},
		}
	}
}
