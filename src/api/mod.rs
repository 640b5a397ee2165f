// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod http_server;

pub use errors::{ApiError, ErrorResponse};
pub use extract::{extract_handler, ExtractRequest, ExtractResponse};
pub use handlers::{health_handler, status_handler, HealthResponse, StatusResponse};
pub use http_server::{create_app, start_server, AppState};
