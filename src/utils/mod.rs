//! Utility modules supporting hub operations.
//!
//! This module provides the plumbing used throughout the library:
//!
//! - [`HttpClient`]: Shared HTTP client with sane timeouts and a crate user agent
//! - [`RetrySettings`]: Configuration for linear-backoff retry of transient errors
//! - [`with_retry`]: Execute an operation with automatic retry on transient errors
//! - [`BoundedTimeout`]: Bounded worker pool with a wall-clock deadline per task
//!
//! # Retry with Linear Backoff
//!
//! ```rust,no_run
//! use hubfetch::utils::{with_retry, RetrySettings};
//! use hubfetch::hub::HubError;
//!
//! # async fn fetch_data() -> Result<String, HubError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), HubError> {
//! let settings = RetrySettings::default().max_retries(3);
//! let result = with_retry(settings, || async { fetch_data().await }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Bounded Execution with a Deadline
//!
//! ```rust,no_run
//! use hubfetch::utils::BoundedTimeout;
//! use hubfetch::hub::HubError;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), HubError> {
//! let pool = BoundedTimeout::new(2, Duration::from_secs(30));
//! let value = pool.run(async { Ok::<_, HubError>(42) }).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;
mod timeout;

pub use http::HttpClient;
pub use retry::{with_retry, RetrySettings, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use timeout::{BoundedTimeout, DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT};
