// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Start/end timestamps stamped on state transitions.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunsCoreError;
use crate::state::RunState;

/// The pair of timestamps persisted on a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTimestamps {
	pub start: Option<String>,
	pub end: Option<String>,
}

/// Format as ISO-8601 UTC with second precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RunsCoreError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| RunsCoreError::InvalidTimestamp {
			value: value.to_string(),
			message: e.to_string(),
		})
}

/// Apply the timestamp rules for a transition `from` → `to`.
///
/// The start time is set when a run leaves `Queued`; the end time is set when
/// a run moves from `Queued` or `Running` into a final state. A timestamp that
/// is already present is never overwritten. Returns true if anything changed.
pub fn stamp_transition(
	from: RunState,
	to: RunState,
	timestamps: &mut RunTimestamps,
	now: DateTime<Utc>,
) -> bool {
	if from == to {
		return false;
	}

	let mut changed = false;
	let stamp = format_timestamp(now);

	if from == RunState::Queued && timestamps.start.is_none() {
		timestamps.start = Some(stamp.clone());
		changed = true;
	}

	if !from.is_final() && to.is_final() && timestamps.end.is_none() {
		timestamps.end = Some(stamp);
		changed = true;
	}

	changed
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn at(secs: i64) -> DateTime<Utc> {
		Utc.timestamp_opt(1_526_566_213 + secs, 0).unwrap()
	}

	#[test]
	fn formats_with_zulu_suffix_and_second_precision() {
		let ts = Utc.with_ymd_and_hms(2018, 5, 17, 14, 10, 13).unwrap()
			+ chrono::Duration::milliseconds(731);
		assert_eq!(format_timestamp(ts), "2018-05-17T14:10:13Z");
	}

	#[test]
	fn parses_what_it_formats() {
		let ts = Utc.with_ymd_and_hms(2018, 5, 17, 14, 15, 41).unwrap();
		assert_eq!(parse_timestamp("2018-05-17T14:15:41Z"), Ok(ts));
		assert!(parse_timestamp("12:10:19Z").is_err());
	}

	#[test]
	fn leaving_queued_sets_start_only() {
		let mut ts = RunTimestamps::default();
		assert!(stamp_transition(RunState::Queued, RunState::Running, &mut ts, at(0)));
		assert_eq!(ts.start.as_deref(), Some("2018-05-17T14:10:13Z"));
		assert!(ts.end.is_none());
	}

	#[test]
	fn queued_straight_to_final_sets_both() {
		let mut ts = RunTimestamps::default();
		assert!(stamp_transition(RunState::Queued, RunState::Failed, &mut ts, at(5)));
		assert_eq!(ts.start, ts.end);
		assert!(ts.start.is_some());
	}

	#[test]
	fn running_to_final_sets_end_and_keeps_start() {
		let mut ts = RunTimestamps {
			start: Some("2018-05-17T14:10:13Z".to_string()),
			end: None,
		};
		assert!(stamp_transition(RunState::Running, RunState::Complete, &mut ts, at(328)));
		assert_eq!(ts.start.as_deref(), Some("2018-05-17T14:10:13Z"));
		assert_eq!(ts.end.as_deref(), Some("2018-05-17T14:15:41Z"));
	}

	#[test]
	fn never_overwrites_existing_timestamps() {
		let mut ts = RunTimestamps {
			start: Some("first".to_string()),
			end: Some("first-end".to_string()),
		};
		assert!(!stamp_transition(RunState::Queued, RunState::Complete, &mut ts, at(99)));
		assert_eq!(ts.start.as_deref(), Some("first"));
		assert_eq!(ts.end.as_deref(), Some("first-end"));
	}

	#[test]
	fn no_transition_changes_nothing() {
		let mut ts = RunTimestamps::default();
		assert!(!stamp_transition(RunState::Queued, RunState::Queued, &mut ts, at(0)));
		assert_eq!(ts, RunTimestamps::default());
	}
}
