//! # rebound-http
//!
//! HTTP transport adapter for the Rebound retry executor.
//!
//! [`HttpClient`] is the call surface. [`ReqwestClient`] implements it over
//! `reqwest` and returns every response as data. [`RetryingClient`] wraps any
//! `HttpClient` and implements the same trait, so call sites gain retries by
//! substitution: error statuses become [`HttpError::Status`] failures and are
//! classified with the same rules as transport errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use rebound_core::types::{HttpConfig, RetryPolicy};
//! use rebound_http::{HttpClient, ReqwestClient, RetryingClient};
//!
//! async fn example() -> Result<(), rebound_http::HttpError> {
//!     let inner = ReqwestClient::new(&HttpConfig::default())?;
//!     let client = RetryingClient::new(inner, RetryPolicy::default());
//!
//!     let response = client.get("https://example.com/health").await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod request;
mod retrying;

pub use client::{HttpClient, ReqwestClient};
pub use error::HttpError;
pub use request::{HttpRequest, HttpResponse, Method};
pub use retrying::RetryingClient;
