// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Embedding Service

/// Full version string with feature description
pub const VERSION: &str = "v2.0.0-onnx-multilingual-e5-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "single-embed",
    "batch-embed",
    "model-info",
    "bearer-auth",
    "cors",
    "readiness-gate",
    "onnx-runtime",
    "cuda-fallback",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Embedding Service {} ({})", VERSION_NUMBER, BUILD_DATE)
}
