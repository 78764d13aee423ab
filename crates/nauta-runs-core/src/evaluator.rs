// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! State evaluator.
//!
//! Computes the state a run should be in from a snapshot of its pods. The
//! evaluator is deterministic and never touches the cluster; callers fetch the
//! snapshot and persist the result.

use crate::pods::PodPhase;
use crate::state::RunState;

/// Everything the evaluator looks at for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunSnapshot<'a> {
	/// State currently persisted on the resource.
	pub state: RunState,
	/// The resource carries a cancellation request.
	pub cancel_requested: bool,
	/// Phases of the run's underlying pods.
	pub pods: &'a [PodPhase],
}

impl<'a> RunSnapshot<'a> {
	pub fn new(state: RunState, pods: &'a [PodPhase]) -> Self {
		Self {
			state,
			cancel_requested: false,
			pods,
		}
	}

	pub fn with_cancel_requested(mut self, cancel_requested: bool) -> Self {
		self.cancel_requested = cancel_requested;
		self
	}
}

/// Compute the state the run should be in.
///
/// Rules, first match wins:
/// 1. a final state is kept as is
/// 2. a cancellation request yields `Cancelled`
/// 3. any failed pod yields `Failed`, even if others succeeded
/// 4. no pods yet, or any pod still waiting, yields `Queued` (a run that is
///    already `Running` stays `Running`)
/// 5. all pods succeeded yields `Complete`
/// 6. otherwise `Running`
pub fn calculate_current_state(snapshot: &RunSnapshot<'_>) -> RunState {
	let current = snapshot.state;
	if current.is_final() {
		return current;
	}

	if snapshot.cancel_requested {
		return RunState::Cancelled;
	}

	let pods = snapshot.pods;
	if pods.iter().any(|p| *p == PodPhase::Failed) {
		return RunState::Failed;
	}

	if pods.is_empty() || pods.iter().any(|p| p.is_waiting()) {
		return match current {
			RunState::Running => RunState::Running,
			_ => RunState::Queued,
		};
	}

	if pods.iter().all(|p| *p == PodPhase::Succeeded) {
		return RunState::Complete;
	}

	RunState::Running
}
