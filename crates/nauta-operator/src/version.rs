// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Build information for nauta-operator.

/// Format version info for display.
pub fn format_version_info() -> String {
	format!(
		"nauta-operator version: {}\n\
         Platform:               {}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_version_info_names_the_binary() {
		let info = format_version_info();
		assert!(info.starts_with("nauta-operator version: "));
		assert!(info.contains(env!("CARGO_PKG_VERSION")));
	}
}
