// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RunsCoreError;

/// Lifecycle state of a run, persisted as `spec.state`.
///
/// States only move towards a final state: `Queued` → `Running` →
/// `Complete`/`Failed`/`Cancelled`, with `Queued` allowed to jump straight to
/// any final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
	/// Submitted, pods not yet scheduled
	Queued,
	/// At least one pod running, none failed
	Running,
	/// All pods succeeded
	Complete,
	/// A pod failed
	Failed,
	/// Cancelled on request
	Cancelled,
}

impl RunState {
	pub const ALL: [RunState; 5] = [
		RunState::Queued,
		RunState::Running,
		RunState::Complete,
		RunState::Failed,
		RunState::Cancelled,
	];

	/// No further transitions happen out of a final state.
	pub fn is_final(self) -> bool {
		match self {
			RunState::Complete | RunState::Failed | RunState::Cancelled => true,
			RunState::Queued | RunState::Running => false,
		}
	}

	/// Wire representation stored in the resource.
	pub fn as_str(self) -> &'static str {
		match self {
			RunState::Queued => "QUEUED",
			RunState::Running => "RUNNING",
			RunState::Complete => "COMPLETE",
			RunState::Failed => "FAILED",
			RunState::Cancelled => "CANCELLED",
		}
	}

	/// Parse the persisted field. A run without a state has not been stamped
	/// by its submitter yet and counts as queued.
	pub fn from_persisted(value: Option<&str>) -> Result<Self, RunsCoreError> {
		match value {
			None => Ok(RunState::Queued),
			Some(s) => s.parse(),
		}
	}
}

impl fmt::Display for RunState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RunState {
	type Err = RunsCoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"QUEUED" => Ok(RunState::Queued),
			"RUNNING" => Ok(RunState::Running),
			"COMPLETE" => Ok(RunState::Complete),
			"FAILED" => Ok(RunState::Failed),
			"CANCELLED" => Ok(RunState::Cancelled),
			other => Err(RunsCoreError::UnknownState(other.to_string())),
		}
	}
}
