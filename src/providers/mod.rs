//! Optimization service providers.
//!
//! The decision engine talks to the remote service through the
//! [`Optimizer`] trait only. [`HttpOptimizer`] is the production client;
//! tests and embedding hosts can inject their own implementation.

pub mod http;
pub mod traits;

pub use http::{HttpOptimizer, hash_secret};
pub use traits::{OptimizationResult, OptimizeResponse, Optimizer};
