// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for run core parsing.

use thiserror::Error;

/// Result type for run core operations.
pub type Result<T> = std::result::Result<T, RunsCoreError>;

/// Errors raised while interpreting persisted run fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunsCoreError {
	#[error("unknown run state: {0}")]
	UnknownState(String),

	#[error("unknown run kind: {0}")]
	UnknownKind(String),

	#[error("invalid timestamp '{value}': {message}")]
	InvalidTimestamp { value: String, message: String },
}
