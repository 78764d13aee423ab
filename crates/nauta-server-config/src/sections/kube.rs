// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cluster connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cluster connection configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct KubeConfig {
	/// Explicit kubeconfig; `None` uses in-cluster credentials or `KUBECONFIG`.
	pub kubeconfig: Option<PathBuf>,
	/// Namespace to watch; `None` watches the whole cluster.
	pub namespace: Option<String>,
	pub request_timeout_secs: u64,
}

impl KubeConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

impl Default for KubeConfig {
	fn default() -> Self {
		Self {
			kubeconfig: None,
			namespace: None,
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
		}
	}
}

/// Cluster configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubeConfigLayer {
	#[serde(default)]
	pub kubeconfig: Option<PathBuf>,
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
}

impl KubeConfigLayer {
	pub fn merge(&mut self, other: KubeConfigLayer) {
		if other.kubeconfig.is_some() {
			self.kubeconfig = other.kubeconfig;
		}
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> KubeConfig {
		KubeConfig {
			kubeconfig: self.kubeconfig,
			namespace: self.namespace,
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = KubeConfigLayer::default().finalize();
		assert_eq!(config, KubeConfig::default());
		assert!(config.namespace.is_none());
		assert_eq!(config.request_timeout(), Duration::from_secs(30));
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let layer: KubeConfigLayer = toml::from_str(
			r#"
namespace = "mciesiel-dev"
kubeconfig = "/home/nauta/.kube/config"
"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.namespace.as_deref(), Some("mciesiel-dev"));
		assert_eq!(
			config.kubeconfig,
			Some(PathBuf::from("/home/nauta/.kube/config"))
		);
		assert_eq!(config.request_timeout_secs, 30);
	}
}
