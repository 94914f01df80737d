// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security headers, metrics).

pub mod auth;
pub mod metrics;
pub mod security;

pub use auth::{require_auth, AuthUser};
