// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Keyword extraction API module
//!
//! Provides the POST /extract endpoint.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::extract_handler;
pub use request::ExtractRequest;
pub use response::ExtractResponse;
