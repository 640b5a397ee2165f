// Version information for the keyword stem service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Full version string with feature description
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"), "-onnx-keyword-extraction");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "background-model-loading",
    "load-progress-status",
    "embedding-keyword-extraction",
    "ngram-candidates",
    "huggingface-hub-download",
    "cuda-fallback-cpu",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} ({} features)", VERSION, FEATURES.len())
}
