// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client-side filtering of listed runs.

use kube::ResourceExt;
use nauta_runs_core::{RunKind, RunState};
use regex::Regex;

use crate::error::K8sError;
use crate::types::Run;

/// Criteria for listing runs. Every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
	name_pattern: Option<Regex>,
	states: Vec<RunState>,
	excluded_state: Option<RunState>,
	experiment_name: Option<String>,
	kinds: Vec<RunKind>,
}

impl RunFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Keep runs whose name matches the regular expression anywhere.
	pub fn name_matching(mut self, pattern: &str) -> Result<Self, K8sError> {
		let regex = Regex::new(pattern).map_err(|e| K8sError::InvalidFilter {
			message: format!("bad name pattern '{pattern}': {e}"),
		})?;
		self.name_pattern = Some(regex);
		Ok(self)
	}

	pub fn with_states(mut self, states: impl IntoIterator<Item = RunState>) -> Self {
		self.states.extend(states);
		self
	}

	pub fn excluding_state(mut self, state: RunState) -> Self {
		self.excluded_state = Some(state);
		self
	}

	pub fn for_experiment(mut self, experiment_name: impl Into<String>) -> Self {
		self.experiment_name = Some(experiment_name.into());
		self
	}

	pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = RunKind>) -> Self {
		self.kinds.extend(kinds);
		self
	}

	pub fn matches(&self, run: &Run) -> bool {
		if let Some(regex) = &self.name_pattern {
			if !regex.is_match(&run.name_any()) {
				return false;
			}
		}

		// A run whose state cannot be parsed matches no state criterion.
		let state = run.state().ok();
		if !self.states.is_empty() && !state.is_some_and(|s| self.states.contains(&s)) {
			return false;
		}
		if let Some(excluded) = self.excluded_state {
			if state == Some(excluded) {
				return false;
			}
		}

		if let Some(experiment) = &self.experiment_name {
			if run.spec.experiment_name.as_deref() != Some(experiment.as_str()) {
				return false;
			}
		}

		if !self.kinds.is_empty() && !run.kind().is_some_and(|k| self.kinds.contains(&k)) {
			return false;
		}

		true
	}

	pub fn apply(&self, runs: Vec<Run>) -> Vec<Run> {
		runs.into_iter().filter(|r| self.matches(r)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{RunSpec, RUN_KIND_LABEL};

	fn run(name: &str, state: Option<&str>, experiment: &str, kind: Option<&str>) -> Run {
		let mut run = Run::named(
			"ns",
			name,
			RunSpec {
				experiment_name: Some(experiment.to_string()),
				state: state.map(str::to_string),
				..Default::default()
			},
		);
		if let Some(kind) = kind {
			run.labels_mut()
				.insert(RUN_KIND_LABEL.to_string(), kind.to_string());
		}
		run
	}

	fn names(runs: &[Run]) -> Vec<String> {
		runs.iter().map(|r| r.name_any()).collect()
	}

	fn fixture() -> Vec<Run> {
		vec![
			run("mnist-1", Some("RUNNING"), "mnist", Some("training")),
			run("mnist-2", Some("COMPLETE"), "mnist", Some("training")),
			run("notebook", Some("RUNNING"), "jupyter-exp", Some("jupyter")),
			run("broken", Some("WHATEVER"), "mnist", None),
			run("fresh", None, "serving", Some("inference")),
		]
	}

	#[test]
	fn empty_filter_keeps_everything() {
		assert_eq!(RunFilter::new().apply(fixture()).len(), 5);
	}

	#[test]
	fn filters_by_name_pattern() {
		let filter = RunFilter::new().name_matching("^mnist-").unwrap();
		assert_eq!(names(&filter.apply(fixture())), vec!["mnist-1", "mnist-2"]);
	}

	#[test]
	fn invalid_pattern_is_an_error() {
		let err = RunFilter::new().name_matching("(unclosed").unwrap_err();
		assert!(matches!(err, K8sError::InvalidFilter { .. }));
	}

	#[test]
	fn filters_by_state_and_treats_missing_state_as_queued() {
		let filter = RunFilter::new().with_states([RunState::Running, RunState::Queued]);
		assert_eq!(
			names(&filter.apply(fixture())),
			vec!["mnist-1", "notebook", "fresh"]
		);
	}

	#[test]
	fn excluded_state_keeps_unparseable_runs() {
		let filter = RunFilter::new().excluding_state(RunState::Running);
		assert_eq!(
			names(&filter.apply(fixture())),
			vec!["mnist-2", "broken", "fresh"]
		);
	}

	#[test]
	fn filters_by_experiment_and_kind() {
		let filter = RunFilter::new()
			.for_experiment("mnist")
			.with_kinds([RunKind::Training]);
		assert_eq!(names(&filter.apply(fixture())), vec!["mnist-1", "mnist-2"]);

		let filter = RunFilter::new().with_kinds([RunKind::Jupyter, RunKind::Inference]);
		assert_eq!(names(&filter.apply(fixture())), vec!["notebook", "fresh"]);
	}
}
