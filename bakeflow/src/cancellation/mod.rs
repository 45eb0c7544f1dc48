//! Structured cancellation and cleanup utilities.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - CleanupGuard for cleanup that survives a dropped future

mod guard;
mod token;

pub use guard::CleanupGuard;
pub use token::CancellationToken;
