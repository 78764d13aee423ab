// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run monitoring for the Nauta operator.
//!
//! One monitor task per run polls the run and its pods and persists state
//! changes until the run reaches a final state. The [`EventDispatcher`]
//! starts, re-attaches and cancels those tasks in response to watch events,
//! using a [`TaskRegistry`] to keep at most one task per run.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod monitor;
pub mod registry;

pub use context::CancellationToken;
pub use dispatcher::EventDispatcher;
pub use error::MonitorError;
pub use events::{EventTranslator, RunEvent};
pub use monitor::{MonitorExit, MonitorSettings, RunMonitor};
pub use registry::{TaskLease, TaskRegistry};
