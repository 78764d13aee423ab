// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RunsCoreError;

/// Kind of workload a run represents, carried in the `runKind` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
	Training,
	Jupyter,
	Inference,
}

impl RunKind {
	pub fn as_str(self) -> &'static str {
		match self {
			RunKind::Training => "training",
			RunKind::Jupyter => "jupyter",
			RunKind::Inference => "inference",
		}
	}
}

impl fmt::Display for RunKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RunKind {
	type Err = RunsCoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"training" => Ok(RunKind::Training),
			"jupyter" => Ok(RunKind::Jupyter),
			"inference" => Ok(RunKind::Inference),
			other => Err(RunsCoreError::UnknownKind(other.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_label_values() {
		assert_eq!("training".parse::<RunKind>(), Ok(RunKind::Training));
		assert_eq!("jupyter".parse::<RunKind>(), Ok(RunKind::Jupyter));
		assert_eq!("inference".parse::<RunKind>(), Ok(RunKind::Inference));
		assert!("Training".parse::<RunKind>().is_err());
	}
}
