use anyhow::{anyhow, Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use axum::http::Extensions;
use log::{debug, error, warn};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub max_requests_per_second: u32,
    pub max_transient_retries: u32,
}

/// Number of requests that left the process since the last reset.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU64>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns the count before the reset.
    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::SeqCst)
    }
}

pub fn create_client(settings: &ClientSettings, maybe_bearer_token: Option<String>, call_counter: CallCounter) -> Result<ClientWithMiddleware> {
    let reqwest_client = Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .context("Failed to build http client")?;

    let per_second = NonZeroU32::new(settings.max_requests_per_second).ok_or_else(|| anyhow!("max_requests_per_second must be greater than 0"))?;
    let limiter = RateLimiter::direct(Quota::per_second(per_second));

    let rate_limiting_middleware = RateLimitingMiddleware { limiter: Arc::new(limiter) };

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_transient_retries);

    let client_builder = ClientBuilder::new(reqwest_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(EmptyPostMiddleware)
        .with(ErrorLoggingMiddleware)
        .with(CallCountingMiddleware { counter: call_counter })
        .with(rate_limiting_middleware);

    let client = match maybe_bearer_token {
        None => client_builder.build(),
        Some(token) => client_builder
            .with(AuthenticatedHeaderMiddleware::new(&token)?)
            .build(),
    };

    Ok(client)
}

struct AuthenticatedHeaderMiddleware {
    header_value: HeaderValue,
}

impl AuthenticatedHeaderMiddleware {
    pub fn new(bearer_token: &str) -> Result<Self> {
        let mut header_value = HeaderValue::from_str(&format!("Bearer {}", bearer_token.trim())).context("Bearer token is not a valid header value")?;
        header_value.set_sensitive(true);
        Ok(Self { header_value })
    }
}

#[async_trait::async_trait]
impl Middleware for AuthenticatedHeaderMiddleware {
    async fn handle(&self, mut req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        req.headers_mut().insert(AUTHORIZATION, self.header_value.clone());
        next.run(req, extensions).await
    }
}

struct RateLimitingMiddleware {
    limiter: Arc<DefaultDirectRateLimiter>,
}

#[async_trait::async_trait]
impl Middleware for RateLimitingMiddleware {
    async fn handle(&self, req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        self.limiter.until_ready().await;
        next.run(req, extensions).await
    }
}

struct CallCountingMiddleware {
    counter: CallCounter,
}

#[async_trait::async_trait]
impl Middleware for CallCountingMiddleware {
    async fn handle(&self, req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        self.counter.increment();
        next.run(req, extensions).await
    }
}

/// The spacetraders api expects POST requests with an empty body
/// to have a content-type of application/json and a content-length of 0.
#[derive(Clone)]
pub struct EmptyPostMiddleware;

#[async_trait::async_trait]
impl Middleware for EmptyPostMiddleware {
    async fn handle(&self, mut req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        if req.method() == reqwest::Method::POST && req.body().is_none() {
            let headers = req.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
            *req.body_mut() = Some(reqwest::Body::from(Vec::<u8>::new()));
        }
        next.run(req, extensions).await
    }
}

/// Logs every non-2xx response. 429s are retried by `RetryTransientMiddleware` and only warned about.
pub struct ErrorLoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for ErrorLoggingMiddleware {
    async fn handle(&self, req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        let started = Instant::now();
        let method = req.method().clone();
        let url = req.url().clone();

        let result = next.run(req, extensions).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("{} {} was rate-limited after {:?}", method, url, elapsed)
            }
            Ok(resp) if !resp.status().is_success() => error!("{} {} returned {} after {:?}", method, url, resp.status(), elapsed),
            Ok(_) => debug!("{} {} took {:?}", method, url, elapsed),
            Err(e) => error!("{} {} failed after {:?}: {}", method, url, elapsed, e),
        }

        result
    }
}
