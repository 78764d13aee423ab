// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pod phases as reported by the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one of a run's underlying pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodPhase {
	/// Accepted, containers not all started (includes unscheduled pods)
	Pending,
	Running,
	Succeeded,
	Failed,
	/// Node lost contact or the phase was not reported
	Unknown,
}

impl PodPhase {
	/// Map the `status.phase` string of a pod. Missing or unrecognised phases
	/// are `Unknown`.
	pub fn from_phase(phase: Option<&str>) -> Self {
		match phase {
			Some("Pending") => PodPhase::Pending,
			Some("Running") => PodPhase::Running,
			Some("Succeeded") => PodPhase::Succeeded,
			Some("Failed") => PodPhase::Failed,
			_ => PodPhase::Unknown,
		}
	}

	/// Not yet scheduled or not yet observable as running.
	pub fn is_waiting(self) -> bool {
		matches!(self, PodPhase::Pending | PodPhase::Unknown)
	}
}

impl fmt::Display for PodPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			PodPhase::Pending => "Pending",
			PodPhase::Running => "Running",
			PodPhase::Succeeded => "Succeeded",
			PodPhase::Failed => "Failed",
			PodPhase::Unknown => "Unknown",
		};
		f.write_str(s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_known_phases() {
		assert_eq!(PodPhase::from_phase(Some("Pending")), PodPhase::Pending);
		assert_eq!(PodPhase::from_phase(Some("Running")), PodPhase::Running);
		assert_eq!(PodPhase::from_phase(Some("Succeeded")), PodPhase::Succeeded);
		assert_eq!(PodPhase::from_phase(Some("Failed")), PodPhase::Failed);
	}

	#[test]
	fn missing_or_odd_phase_is_unknown() {
		assert_eq!(PodPhase::from_phase(None), PodPhase::Unknown);
		assert_eq!(PodPhase::from_phase(Some("Evicted")), PodPhase::Unknown);
		assert!(PodPhase::Unknown.is_waiting());
		assert!(!PodPhase::Running.is_waiting());
	}
}
