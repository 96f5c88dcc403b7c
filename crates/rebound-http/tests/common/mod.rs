//! Common test infrastructure for rebound-http tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_server;

pub use mock_server::*;

use std::sync::Arc;
use std::time::Duration;

use rebound_core::retry::{NoJitter, RetryExecutor, StatsObserver};
use rebound_core::types::{HttpConfig, RetryPolicy};
use rebound_http::{ReqwestClient, RetryingClient};

/// A policy with millisecond delays so tests run against real sockets quickly
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_initial_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(20))
}

pub fn reqwest_client() -> ReqwestClient {
    let config = HttpConfig {
        timeout_secs: 5,
        connect_timeout_secs: 2,
        ..HttpConfig::default()
    };
    ReqwestClient::new(&config).expect("client should build")
}

/// Retrying client over reqwest with stats collection and no jitter
pub fn retrying_client(
    max_attempts: u32,
) -> (RetryingClient<ReqwestClient, Arc<StatsObserver>>, Arc<StatsObserver>) {
    let stats = Arc::new(StatsObserver::new());
    let executor = RetryExecutor::builder()
        .with_policy(fast_policy(max_attempts))
        .with_observer(Arc::clone(&stats))
        .with_jitter(NoJitter)
        .build();
    let client = RetryingClient::with_executor(reqwest_client(), Arc::new(executor));
    (client, stats)
}
