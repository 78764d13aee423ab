// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Cannot connect to cluster: {message}")]
	Connection { message: String },

	#[error("Run not found: {namespace}/{name}")]
	RunNotFound { namespace: String, name: String },

	#[error("Run was modified concurrently: {namespace}/{name}")]
	Conflict { namespace: String, name: String },

	#[error("Operation timed out")]
	Timeout,

	#[error("Watch error: {message}")]
	WatchError { message: String },

	#[error("Invalid run filter: {message}")]
	InvalidFilter { message: String },
}

impl K8sError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, K8sError::RunNotFound { .. })
	}

	/// Errors caused by cluster or network conditions rather than by the
	/// request itself, so the same call may succeed later.
	///
	/// Conflicts count: a fresh read gives a copy the update can apply to.
	/// Connection errors count since a client that failed to initialise
	/// retries on its next call.
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			K8sError::ApiError { .. }
				| K8sError::Connection { .. }
				| K8sError::Conflict { .. }
				| K8sError::Timeout
				| K8sError::WatchError { .. }
		)
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
