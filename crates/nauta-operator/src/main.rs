// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Nauta run operator binary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use nauta_server_config::{LoggingConfig, OperatorConfig};
use nauta_server_k8s::{KubeClient, KubeClientConfig, Run, RunClient};
use nauta_server_runs::{CancellationToken, EventDispatcher, MonitorSettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod version;

use cli::{Args, Command, ListArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => nauta_server_config::load_config_with_file(path)?,
		None => nauta_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	let client = Arc::new(KubeClient::new(KubeClientConfig {
		kubeconfig: config.kube.kubeconfig.clone(),
		request_timeout: Some(config.kube.request_timeout()),
	}));

	match args.command {
		Some(Command::List(list)) => list_runs(client.as_ref(), &config, &list).await,
		_ => run_operator(client, &config).await,
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	// stdout is reserved for `list` output
	if logging.json {
		registry
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		registry
			.with(fmt::layer().with_writer(std::io::stderr))
			.init();
	}
}

fn monitor_settings(config: &OperatorConfig) -> MonitorSettings {
	MonitorSettings {
		poll_interval: config.monitor.poll_interval(),
		retry_limit: config.monitor.retry_limit,
		request_timeout: config.kube.request_timeout(),
	}
}

async fn run_operator(
	client: Arc<KubeClient>,
	config: &OperatorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	if let Err(e) = client.connect().await {
		tracing::error!(error = %e, "Cannot reach the cluster, refusing to start");
		return Err(e.into());
	}

	let namespace = config.kube.namespace.as_deref();
	tracing::info!(
		namespace = namespace.unwrap_or("<all>"),
		poll_interval_ms = config.monitor.poll_interval_ms,
		retry_limit = config.monitor.retry_limit,
		"starting nauta-operator"
	);

	let events = client.watch_runs(namespace).await?;
	let dispatcher = EventDispatcher::new(client, monitor_settings(config));

	let shutdown = CancellationToken::new();
	tokio::spawn({
		let shutdown = shutdown.clone();
		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("Received shutdown signal");
				shutdown.cancel();
			}
		}
	});

	dispatcher.run(events, shutdown.clone()).await;

	tracing::info!("Shutting down run monitors...");
	dispatcher.shutdown().await;

	if !shutdown.is_cancelled() {
		return Err("run watch ended unexpectedly".into());
	}

	tracing::info!("Operator shutdown complete");
	Ok(())
}

async fn list_runs(
	client: &dyn RunClient,
	config: &OperatorConfig,
	list: &ListArgs,
) -> Result<(), Box<dyn std::error::Error>> {
	let filter = list.filter()?;
	let runs = client
		.list_runs(list.namespace(config.kube.namespace.as_deref()), &filter)
		.await?;

	let now = Utc::now();
	for run in &runs {
		println!("{}", serde_json::to_string(&list_entry(run, now))?);
	}
	tracing::debug!(count = runs.len(), "Listed runs");
	Ok(())
}

/// One `list` output line: the run plus the template it came from and its
/// duration in seconds so far.
fn list_entry(run: &Run, now: DateTime<Utc>) -> serde_json::Value {
	serde_json::json!({
		"run": run,
		"template": run.template_name(),
		"duration_secs": run.duration(now).map(|d| d.num_seconds()),
	})
}
