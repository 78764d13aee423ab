// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Nauta run operator.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`NAUTA_OPERATOR_*`)
//!
//! # Usage
//!
//! ```ignore
//! use nauta_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Polling runs every {:?}", config.monitor.poll_interval());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::OperatorConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved operator configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorConfig {
	pub kube: KubeConfig,
	pub monitor: MonitorConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`NAUTA_OPERATOR_*`)
/// 2. Config file (`/etc/nauta/operator.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<OperatorConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<OperatorConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<OperatorConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = OperatorConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: OperatorConfigLayer) -> Result<OperatorConfig, ConfigError> {
	let kube = layer.kube.unwrap_or_default().finalize();
	let monitor = layer.monitor.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&kube, &monitor)?;

	info!(
		namespace = kube.namespace.as_deref().unwrap_or("<all>"),
		kubeconfig_set = kube.kubeconfig.is_some(),
		request_timeout_secs = kube.request_timeout_secs,
		poll_interval_ms = monitor.poll_interval_ms,
		retry_limit = monitor.retry_limit,
		"Operator configuration loaded"
	);

	Ok(OperatorConfig {
		kube,
		monitor,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(kube: &KubeConfig, monitor: &MonitorConfig) -> Result<(), ConfigError> {
	if monitor.poll_interval_ms == 0 {
		return Err(ConfigError::Validation(
			"monitor.poll_interval_ms must be greater than zero".to_string(),
		));
	}
	if monitor.retry_limit == 0 {
		return Err(ConfigError::Validation(
			"monitor.retry_limit must be greater than zero".to_string(),
		));
	}
	if kube.request_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"kube.request_timeout_secs must be greater than zero".to_string(),
		));
	}

	Ok(())
}
