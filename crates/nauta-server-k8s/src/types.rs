// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{CustomResource, ResourceExt};
use nauta_runs_core::{
	calculate_current_state, parse_timestamp, PodPhase, RunKind, RunSnapshot, RunState,
	RunTimestamps, RunsCoreError,
};
use serde::{Deserialize, Serialize};

use crate::error::K8sError;

pub const API_GROUP: &str = "aipg.intel.com";
pub const API_VERSION: &str = "v1";

/// Annotation an external actor sets to request cancellation of a run.
pub const CANCEL_REQUESTED_ANNOTATION: &str = "aipg.intel.com/cancel-requested";
/// Label carrying the run kind (`training`, `jupyter`, `inference`).
pub const RUN_KIND_LABEL: &str = "runKind";
/// Label on underlying pods pointing back at their run.
pub const RUN_NAME_LABEL: &str = "runName";

/// Spec of a Nauta run.
///
/// Everything except `state` and the two timestamps is written by the
/// submitter and passed through untouched.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
	group = "aipg.intel.com",
	version = "v1",
	kind = "Run",
	plural = "runs",
	namespaced,
	schema = "disabled",
	derive = "PartialEq"
)]
#[serde(rename_all = "kebab-case")]
pub struct RunSpec {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub experiment_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parameters: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pod_count: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pod_selector: Option<LabelSelector>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metrics: Option<BTreeMap<String, serde_json::Value>>,
	/// Raw lifecycle state; parsed with [`Run::state`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_time: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_time: Option<String>,
}

impl Run {
	/// Build a run object in a namespace, as a submitter would.
	pub fn named(namespace: &str, name: &str, spec: RunSpec) -> Self {
		let mut run = Run::new(name, spec);
		run.metadata.namespace = Some(namespace.to_string());
		run
	}

	pub fn key(&self) -> RunKey {
		RunKey::new(self.namespace().unwrap_or_default(), self.name_any())
	}

	pub fn state(&self) -> Result<RunState, RunsCoreError> {
		RunState::from_persisted(self.spec.state.as_deref())
	}

	pub fn set_state(&mut self, state: RunState) {
		self.spec.state = Some(state.as_str().to_string());
	}

	pub fn timestamps(&self) -> RunTimestamps {
		RunTimestamps {
			start: self.spec.start_time.clone(),
			end: self.spec.end_time.clone(),
		}
	}

	pub fn set_timestamps(&mut self, timestamps: RunTimestamps) {
		self.spec.start_time = timestamps.start;
		self.spec.end_time = timestamps.end;
	}

	/// Whether an external actor asked for this run to be cancelled.
	pub fn cancel_requested(&self) -> bool {
		self
			.annotations()
			.get(CANCEL_REQUESTED_ANNOTATION)
			.is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	pub fn kind(&self) -> Option<RunKind> {
		self
			.labels()
			.get(RUN_KIND_LABEL)
			.and_then(|v| v.parse().ok())
	}

	/// Template the run was created from (`pod-selector.matchLabels.app`).
	pub fn template_name(&self) -> Option<&str> {
		self
			.spec
			.pod_selector
			.as_ref()
			.and_then(|s| s.match_labels.as_ref())
			.and_then(|labels| labels.get("app"))
			.map(|s| s.as_str())
	}

	/// Wall-clock duration of the run: end minus start once finished, now
	/// minus start while in progress, `None` before it started or when the
	/// stored timestamps cannot be parsed.
	pub fn duration(&self, now: DateTime<Utc>) -> Option<Duration> {
		let start = parse_timestamp(self.spec.start_time.as_deref()?).ok()?;
		match self.spec.end_time.as_deref() {
			Some(end) => Some(parse_timestamp(end).ok()? - start),
			None => Some(now - start),
		}
	}

	/// Evaluator input for this run given its pods.
	pub fn snapshot<'a>(&self, pods: &'a [PodPhase]) -> Result<RunSnapshot<'a>, RunsCoreError> {
		Ok(RunSnapshot::new(self.state()?, pods).with_cancel_requested(self.cancel_requested()))
	}

	/// State this run should be in given its pods.
	pub fn calculate_current_state(&self, pods: &[PodPhase]) -> Result<RunState, RunsCoreError> {
		Ok(calculate_current_state(&self.snapshot(pods)?))
	}
}

/// Identity of a run: namespace plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
	pub namespace: String,
	pub name: String,
}

impl RunKey {
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
		}
	}
}

impl fmt::Display for RunKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}

/// A watch notification for runs.
pub type RunWatchEvent = kube::runtime::watcher::Event<Run>;

/// A pinned stream of run watch notifications.
pub type RunWatchStream = Pin<Box<dyn Stream<Item = Result<RunWatchEvent, K8sError>> + Send>>;
