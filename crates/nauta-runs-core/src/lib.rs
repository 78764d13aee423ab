// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Nauta runs.
//!
//! This crate holds everything about a run's lifecycle that does not need a
//! cluster connection:
//! - The closed set of lifecycle states and run kinds
//! - Pod phases as reported by the orchestrator
//! - The state evaluator that maps a pod snapshot to the state a run should be in
//! - Timestamp stamping rules applied when a run changes state
//!
//! It is used by the Kubernetes resource client (`nauta-server-k8s`) and the
//! run monitor (`nauta-server-runs`).

pub mod error;
pub mod evaluator;
pub mod kind;
pub mod pods;
pub mod state;
pub mod timestamps;

pub use error::{RunsCoreError, Result};
pub use evaluator::{calculate_current_state, RunSnapshot};
pub use kind::RunKind;
pub use pods::PodPhase;
pub use state::RunState;
pub use timestamps::{format_timestamp, parse_timestamp, stamp_transition, RunTimestamps};
