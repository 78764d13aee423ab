// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use nauta_runs_core::PodPhase;

use crate::error::K8sError;
use crate::filter::RunFilter;
use crate::types::{Run, RunWatchStream};

/// Trait for Run resource operations.
///
/// This abstraction allows for easy mocking in tests while providing
/// a clean interface for the operations the run monitor needs.
#[async_trait]
pub trait RunClient: Send + Sync {
	/// Get a run by name from the specified namespace.
	async fn get_run(&self, namespace: &str, name: &str) -> Result<Run, K8sError>;

	/// Replace a run as a whole.
	///
	/// The run's `resourceVersion` must match the stored object, otherwise
	/// the call fails with [`K8sError::Conflict`] and the caller has to re-read.
	async fn replace_run(&self, run: &Run) -> Result<Run, K8sError>;

	/// List runs in a namespace (or across the cluster when `None`) that
	/// match the filter.
	async fn list_runs(&self, namespace: Option<&str>, filter: &RunFilter)
		-> Result<Vec<Run>, K8sError>;

	/// Phases of the pods belonging to a run. A run whose pods do not exist
	/// yet has an empty list.
	async fn list_run_pods(&self, namespace: &str, run_name: &str)
		-> Result<Vec<PodPhase>, K8sError>;

	/// Watch runs in a namespace (or across the cluster when `None`).
	///
	/// The stream starts with the current objects (`Init`, `InitApply`...,
	/// `InitDone`) and then yields `Apply`/`Delete` as runs change.
	async fn watch_runs(&self, namespace: Option<&str>) -> Result<RunWatchStream, K8sError>;
}
