// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use nauta_runs_core::RunsCoreError;
use nauta_server_k8s::K8sError;
use thiserror::Error;

/// Why a single poll of a run did not complete.
#[derive(Error, Debug)]
pub enum MonitorError {
	#[error(transparent)]
	Client(#[from] K8sError),

	#[error("Invalid run state: {0}")]
	InvalidState(#[from] RunsCoreError),

	#[error("Monitor cancelled")]
	Cancelled,
}

impl MonitorError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, MonitorError::Client(e) if e.is_not_found())
	}

	/// Whether the underlying client error is transient. Informational only:
	/// the monitor counts every failure except NotFound, invalid state and
	/// cancellation towards its retry limit.
	pub fn is_transient(&self) -> bool {
		matches!(self, MonitorError::Client(e) if e.is_transient())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_client_errors() {
		let gone = MonitorError::from(K8sError::RunNotFound {
			namespace: "ns".into(),
			name: "r1".into(),
		});
		assert!(gone.is_not_found());
		assert!(!gone.is_transient());

		assert!(MonitorError::from(K8sError::Timeout).is_transient());
		assert!(!MonitorError::Cancelled.is_transient());
		assert!(!MonitorError::from(RunsCoreError::UnknownState("BOGUS".into())).is_transient());
	}
}
