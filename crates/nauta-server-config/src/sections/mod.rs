// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the run operator.

pub mod kube;
pub mod logging;
pub mod monitor;

pub use kube::{KubeConfig, KubeConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use monitor::{MonitorConfig, MonitorConfigLayer};
