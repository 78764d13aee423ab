// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
	api::{Api, ListParams, PostParams},
	config::{KubeConfigOptions, Kubeconfig},
	runtime::{watcher, WatchStreamExt},
	Client, Config, ResourceExt,
};
use nauta_runs_core::PodPhase;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::client::RunClient;
use crate::error::K8sError;
use crate::filter::RunFilter;
use crate::types::{Run, RunWatchStream, RUN_NAME_LABEL};

/// How the production client finds and talks to the cluster.
#[derive(Debug, Clone, Default)]
pub struct KubeClientConfig {
	/// Explicit kubeconfig file. When unset, kube's inference order is used.
	pub kubeconfig: Option<PathBuf>,
	/// Read timeout applied to every API request.
	pub request_timeout: Option<Duration>,
}

/// Production Run client implementation using the kube crate.
///
/// Credentials are resolved on first use and the resulting client is kept
/// for the lifetime of the process.
pub struct KubeClient {
	config: KubeClientConfig,
	client: OnceCell<Client>,
}

impl KubeClient {
	pub fn new(config: KubeClientConfig) -> Self {
		Self {
			config,
			client: OnceCell::new(),
		}
	}

	/// Resolve credentials and check that the API server answers.
	///
	/// Any failure here is a [`K8sError::Connection`]; nothing else in the
	/// operator can work without a cluster.
	#[instrument(skip(self))]
	pub async fn connect(&self) -> Result<(), K8sError> {
		let client = self.client().await?;
		let version = client
			.apiserver_version()
			.await
			.map_err(|e| K8sError::Connection {
				message: e.to_string(),
			})?;
		info!(
			server_version = %version.git_version,
			"Connected to K8s API server"
		);
		Ok(())
	}

	async fn client(&self) -> Result<Client, K8sError> {
		self
			.client
			.get_or_try_init(|| init_client(&self.config))
			.await
			.cloned()
	}

	async fn runs_api(&self, namespace: Option<&str>) -> Result<Api<Run>, K8sError> {
		let client = self.client().await?;
		Ok(match namespace {
			Some(ns) => Api::namespaced(client, ns),
			None => Api::all(client),
		})
	}
}

/// Build a client from an explicit kubeconfig, or infer one: in-cluster
/// service account, then `KUBECONFIG`, then `~/.kube/config`.
async fn init_client(config: &KubeClientConfig) -> Result<Client, K8sError> {
	let connection_error = |message: String| K8sError::Connection { message };

	let mut kube_config = match &config.kubeconfig {
		Some(path) => {
			let kubeconfig = Kubeconfig::read_from(path)
				.map_err(|e| connection_error(format!("{}: {e}", path.display())))?;
			Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
				.await
				.map_err(|e| connection_error(e.to_string()))?
		}
		None => Config::infer()
			.await
			.map_err(|e| connection_error(e.to_string()))?,
	};

	if let Some(timeout) = config.request_timeout {
		kube_config.read_timeout = Some(timeout);
	}

	let client = Client::try_from(kube_config).map_err(|e| connection_error(e.to_string()))?;
	debug!("K8s client initialized");
	Ok(client)
}

fn pod_phase(pod: &Pod) -> PodPhase {
	PodPhase::from_phase(pod.status.as_ref().and_then(|s| s.phase.as_deref()))
}

#[async_trait]
impl RunClient for KubeClient {
	async fn get_run(&self, namespace: &str, name: &str) -> Result<Run, K8sError> {
		let runs = self.runs_api(Some(namespace)).await?;
		match runs.get(name).await {
			Ok(run) => Ok(run),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::RunNotFound {
				namespace: namespace.into(),
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	async fn replace_run(&self, run: &Run) -> Result<Run, K8sError> {
		let name = run.name_any();
		let namespace = run.namespace().ok_or_else(|| K8sError::ApiError {
			message: format!("Run {name} has no namespace"),
		})?;
		let runs = self.runs_api(Some(&namespace)).await?;
		match runs.replace(&name, &PostParams::default(), run).await {
			Ok(run) => Ok(run),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::RunNotFound { namespace, name })
			}
			Err(kube::Error::Api(err)) if err.code == 409 => {
				Err(K8sError::Conflict { namespace, name })
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn list_runs(
		&self,
		namespace: Option<&str>,
		filter: &RunFilter,
	) -> Result<Vec<Run>, K8sError> {
		let runs = self.runs_api(namespace).await?;
		let list = runs.list(&ListParams::default()).await?;
		debug!(count = list.items.len(), "Listed runs");
		Ok(filter.apply(list.items))
	}

	async fn list_run_pods(
		&self,
		namespace: &str,
		run_name: &str,
	) -> Result<Vec<PodPhase>, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client().await?, namespace);
		let lp = ListParams::default().labels(&format!("{RUN_NAME_LABEL}={run_name}"));
		match pods.list(&lp).await {
			Ok(list) => Ok(list.items.iter().map(pod_phase).collect()),
			Err(kube::Error::Api(err)) if err.code == 404 => Ok(Vec::new()),
			Err(e) => Err(e.into()),
		}
	}

	async fn watch_runs(&self, namespace: Option<&str>) -> Result<RunWatchStream, K8sError> {
		let runs = self.runs_api(namespace).await?;
		let stream = watcher(runs, watcher::Config::default())
			.default_backoff()
			.map(|event| {
				event.map_err(|e| K8sError::WatchError {
					message: e.to_string(),
				})
			});
		Ok(Box::pin(stream))
	}
}
