// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run monitor configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_RETRY_LIMIT: u32 = 5;

/// Run monitor configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
	pub poll_interval_ms: u64,
	/// Consecutive failed polls after which a monitor gives up.
	pub retry_limit: u32,
}

impl MonitorConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			retry_limit: DEFAULT_RETRY_LIMIT,
		}
	}
}

/// Monitor configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfigLayer {
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub retry_limit: Option<u32>,
}

impl MonitorConfigLayer {
	pub fn merge(&mut self, other: MonitorConfigLayer) {
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
		if other.retry_limit.is_some() {
			self.retry_limit = other.retry_limit;
		}
	}

	pub fn finalize(self) -> MonitorConfig {
		MonitorConfig {
			poll_interval_ms: self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			retry_limit: self.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_default_values() {
		let config = MonitorConfigLayer::default().finalize();
		assert_eq!(config.poll_interval(), Duration::from_secs(1));
		assert_eq!(config.retry_limit, 5);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = MonitorConfigLayer {
			poll_interval_ms: Some(500),
			retry_limit: Some(3),
		};
		base.merge(MonitorConfigLayer {
			poll_interval_ms: None,
			retry_limit: Some(10),
		});
		assert_eq!(base.poll_interval_ms, Some(500));
		assert_eq!(base.retry_limit, Some(10));
	}

	proptest! {
		#[test]
		fn set_fields_survive_finalize(poll in 1u64..100_000, retries in 1u32..1000) {
			let config = MonitorConfigLayer {
				poll_interval_ms: Some(poll),
				retry_limit: Some(retries),
			}
			.finalize();
			prop_assert_eq!(config.poll_interval_ms, poll);
			prop_assert_eq!(config.retry_limit, retries);
		}
	}
}
