// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{KubeConfigLayer, LoggingConfigLayer, MonitorConfigLayer};

/// Operator configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorConfigLayer {
	#[serde(default)]
	pub kube: Option<KubeConfigLayer>,
	#[serde(default)]
	pub monitor: Option<MonitorConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl OperatorConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: OperatorConfigLayer) {
		merge_option(&mut self.kube, other.kube, KubeConfigLayer::merge);
		merge_option(&mut self.monitor, other.monitor, MonitorConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = OperatorConfigLayer::default();
		base.merge(OperatorConfigLayer::default());
		assert!(base.kube.is_none());
		assert!(base.monitor.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = OperatorConfigLayer {
			monitor: Some(MonitorConfigLayer {
				retry_limit: Some(9),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(OperatorConfigLayer::default());
		assert_eq!(base.monitor.as_ref().unwrap().retry_limit, Some(9));
	}

	#[test]
	fn test_merge_other_overwrites_field_by_field() {
		let mut base = OperatorConfigLayer {
			kube: Some(KubeConfigLayer {
				namespace: Some("nauta".to_string()),
				request_timeout_secs: Some(10),
				..Default::default()
			}),
			..Default::default()
		};
		let other = OperatorConfigLayer {
			kube: Some(KubeConfigLayer {
				request_timeout_secs: Some(60),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(other);

		let kube = base.kube.unwrap();
		assert_eq!(kube.namespace.as_deref(), Some("nauta"));
		assert_eq!(kube.request_timeout_secs, Some(60));
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = OperatorConfigLayer::default();
		let other = OperatorConfigLayer {
			logging: Some(LoggingConfigLayer {
				json: Some(true),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(other);
		assert_eq!(base.logging.unwrap().json, Some(true));
	}
}
