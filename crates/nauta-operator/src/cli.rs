// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nauta_runs_core::{RunKind, RunState, RunsCoreError};
use nauta_server_k8s::{K8sError, RunFilter};

/// Nauta run operator - drives runs from QUEUED to a final state.
#[derive(Parser, Debug)]
#[command(
	name = "nauta-operator",
	about = "Nauta run lifecycle operator",
	version
)]
pub struct Args {
	/// Config file to use instead of /etc/nauta/operator.toml
	#[arg(long, global = true, env = "NAUTA_OPERATOR_CONFIG")]
	pub config: Option<PathBuf>,

	/// What to do; defaults to `run`
	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Watch runs and monitor each one until it finishes
	Run,
	/// Print matching runs as JSON lines
	List(ListArgs),
	/// Show version and build information
	Version,
}

#[derive(clap::Args, Debug, Default)]
pub struct ListArgs {
	/// Namespace to list (defaults to the configured namespace)
	#[arg(short, long, conflicts_with = "all_namespaces")]
	pub namespace: Option<String>,

	/// List runs in every namespace
	#[arg(short = 'A', long)]
	pub all_namespaces: bool,

	/// Regular expression matched against run names
	#[arg(long)]
	pub name: Option<String>,

	/// Only runs in this state; repeatable
	#[arg(long = "state", value_parser = parse_state)]
	pub states: Vec<RunState>,

	/// Leave out runs in this state
	#[arg(long, value_parser = parse_state)]
	pub exclude_state: Option<RunState>,

	/// Only runs of this experiment
	#[arg(long)]
	pub experiment: Option<String>,

	/// Only runs of this kind (training, jupyter, inference); repeatable
	#[arg(long = "kind")]
	pub kinds: Vec<RunKind>,
}

impl ListArgs {
	pub fn filter(&self) -> Result<RunFilter, K8sError> {
		let mut filter = RunFilter::new()
			.with_states(self.states.iter().copied())
			.with_kinds(self.kinds.iter().copied());
		if let Some(pattern) = &self.name {
			filter = filter.name_matching(pattern)?;
		}
		if let Some(state) = self.exclude_state {
			filter = filter.excluding_state(state);
		}
		if let Some(experiment) = &self.experiment {
			filter = filter.for_experiment(experiment.clone());
		}
		Ok(filter)
	}

	/// Namespace to list, or `None` for the whole cluster.
	pub fn namespace<'a>(&'a self, configured: Option<&'a str>) -> Option<&'a str> {
		if self.all_namespaces {
			None
		} else {
			self.namespace.as_deref().or(configured)
		}
	}
}

fn parse_state(value: &str) -> Result<RunState, RunsCoreError> {
	value.to_ascii_uppercase().parse()
}
