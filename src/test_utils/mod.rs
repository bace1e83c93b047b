//! Test utilities for use case and HTTP tests.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A recording payment gateway and a counting rate limiter
//! - `TestAppStateBuilder` for driving routers through `axum-test`

mod app_state_builder;
mod billing_mocks;
mod factories;
mod repo_mocks;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
pub use repo_mocks::*;
