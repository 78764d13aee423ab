// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for Nauta runs.
//!
//! This crate provides:
//! - The `Run` custom resource (`runs.aipg.intel.com/v1`)
//! - A trait-based client for reading, replacing, listing and watching runs
//! - Production implementation using the kube crate, with credentials
//!   resolved lazily on first use
//! - An in-memory mock client for tests

mod client;
mod error;
mod filter;
mod kube_client;
mod mock;
mod types;

pub use client::RunClient;
pub use error::{K8sError, K8sResult};
pub use filter::RunFilter;
pub use kube_client::{KubeClient, KubeClientConfig};
pub use mock::MockRunClient;
pub use types::{
	Run, RunKey, RunSpec, RunWatchEvent, RunWatchStream, API_GROUP, API_VERSION,
	CANCEL_REQUESTED_ANNOTATION, RUN_KIND_LABEL, RUN_NAME_LABEL,
};
