//! okr_client: resilient client for the OKR REST backend
//!
//! Objectives, tasks, users, business units and task challenges all live on
//! the backend; this crate builds authenticated JSON requests, retries
//! transient failures with exponential backoff and reports uniform errors.

pub mod config;
pub mod error;
pub mod retry;
pub mod session;
pub mod models;
pub mod transform;
// Request pipeline + domain operations (impl blocks split across both files)
pub mod client;
pub mod endpoints;
pub mod loader;
pub mod tree;
pub mod logging;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use retry::{with_retry, RetryPolicy};
pub use session::{MemoryTokenStore, SessionContext, SledTokenStore, TokenStore};
