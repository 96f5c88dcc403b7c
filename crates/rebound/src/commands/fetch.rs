//! Fetch command

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use rebound_core::retry::{CallContext, CancellationToken, RetryExecutor, TracingObserver};
use rebound_http::{HttpError, HttpRequest, ReqwestClient, RetryingClient};
use tracing::debug;

use crate::cli::FetchArgs;
use crate::output;

pub async fn run(args: FetchArgs, config_dir: Option<&Utf8Path>) -> Result<()> {
    let config = super::loader(config_dir)?
        .load()
        .context("Failed to load configuration")?;
    let policy = args.policy.apply(config.policy_for(&args.policy.operation));
    policy.validate().context("Invalid retry policy")?;

    let request = build_request(&args)?;

    let token = CancellationToken::new();
    let mut ctx = CallContext::new().with_cancellation(token.clone());
    if let Some(secs) = args.timeout_secs {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    let ctrl_c = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, cancelling request");
                token.cancel();
            }
        }
    });

    let executor = RetryExecutor::builder()
        .with_policy(policy)
        .with_observer(TracingObserver::new(args.policy.operation.clone()))
        .build();
    let inner = ReqwestClient::new(&config.http).context("Failed to build HTTP client")?;
    let mut client = RetryingClient::with_executor(inner, Arc::new(executor));
    if !args.retry_methods.is_empty() {
        client = client.with_methods(args.retry_methods.iter().copied());
    }

    let spinner = output::spinner(&format!("{} {}", request.method, request.url));
    let result = client.send_with(&ctx, request).await;
    spinner.finish_and_clear();
    ctrl_c.abort();

    let response = match result {
        Ok(response) => response,
        Err(HttpError::Interrupted(reason)) => {
            output::error(&format!("Request abandoned: {}", reason));
            return Err(anyhow!(reason));
        }
        Err(e) => return Err(e).context(format!("Request to {} failed", args.url)),
    };

    if response.is_success() {
        output::success(&format!("HTTP {} from {}", response.status, response.url));
    } else {
        output::error(&format!("HTTP {} from {}", response.status, response.url));
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.body)?;
    stdout.flush()?;

    if !response.is_success() {
        return Err(anyhow!("server responded with HTTP {}", response.status));
    }
    Ok(())
}

fn build_request(args: &FetchArgs) -> Result<HttpRequest> {
    let mut request = HttpRequest::new(args.method, args.url.clone());
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request = request.header(name, value);
    }
    if let Some(data) = &args.data {
        request = request.body(data.as_bytes().to_vec());
    }
    Ok(request)
}

/// Split a `Name: value` header argument
fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid header '{}', expected 'Name: value'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Invalid header '{}', name is empty", raw));
    }
    Ok((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: application/json").unwrap(),
            ("Accept", "application/json")
        );
        assert_eq!(parse_header("X-Empty:").unwrap(), ("X-Empty", ""));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }
}
