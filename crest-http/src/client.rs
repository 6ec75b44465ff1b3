//! HTTP transport implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{HttpRequest, HttpResponse};
use once_cell::sync::OnceCell;
use reqwest::{
    self,
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect::Policy,
    Client, Url,
};
use std::net::IpAddr;
use std::time::Instant;
use tracing::{debug, info};

/// Sends one resolved request and returns the raw response.
///
/// Implementations must not retry: a failure is reported once and the caller
/// decides what to do with it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpManager {
    config: HttpConfig,
    verified: OnceCell<Client>,
    unverified: OnceCell<Client>,
}

impl Default for HttpManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpManager {
    /// Create a new HttpManager with default configuration
    pub fn new() -> Self {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HttpManager with specific configuration
    pub fn with_config(config: HttpConfig) -> Self {
        debug!(
            "Creating HttpManager with user agent '{}' and {} max redirects",
            config.user_agent, config.max_redirects
        );
        Self {
            config,
            verified: OnceCell::new(),
            unverified: OnceCell::new(),
        }
    }

    /// One client per TLS policy, built on first use
    fn client(&self, verify_tls: bool) -> Result<&Client, HttpError> {
        let cell = if verify_tls {
            &self.verified
        } else {
            &self.unverified
        };

        cell.get_or_try_init(|| {
            debug!("Creating HTTP client (verify_tls={})", verify_tls);
            Client::builder()
                .user_agent(&self.config.user_agent)
                .danger_accept_invalid_certs(!verify_tls)
                .redirect(redirect_policy(self.config.max_redirects as usize))
                .build()
                .map_err(HttpError::from)
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpManager {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let client = self.client(request.verify_tls)?;

        let mut header_map = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpError::InvalidHeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(name.clone()))?;
            header_map.append(header_name, header_value);
        }

        debug!("Building {} request to {}", request.method, request.url);
        let mut builder = client
            .request(reqwest::Method::from(request.method), &request.url)
            .timeout(request.timeout)
            .headers(header_map);

        if let Some(body) = &request.body {
            debug!("Adding {} byte body to request", body.len());
            builder = builder.body(body.clone());
        }

        let start_time = Instant::now();
        info!("Making HTTP request: {} {}", request.method, request.url);

        let response = builder
            .send()
            .await
            .map_err(|e| classify(e, request))?;

        let status = response.status();
        let status_code = status.as_u16();
        let status_text = status.canonical_reason().unwrap_or("Unknown Status").to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| classify(e, request))?
            .to_vec();

        info!(
            "HTTP response received: {} {} ({} bytes in {}ms)",
            status_code,
            status_text,
            body.len(),
            start_time.elapsed().as_millis()
        );

        Ok(HttpResponse {
            status: status_code,
            status_text,
            body,
        })
    }
}

/// Follow at most `max` redirects, never onto plain HTTP towards another host
fn redirect_policy(max: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= max {
            attempt.error(format!("too many redirects (limit {})", max))
        } else if is_downgrade(attempt.url()) {
            let refused = format!("refusing redirect to plain HTTP URL {}", attempt.url());
            attempt.error(refused)
        } else {
            attempt.follow()
        }
    })
}

/// Plain `http` to anything but `localhost`, `127.0.0.0/8` or `::1`
fn is_downgrade(url: &Url) -> bool {
    if url.scheme() != "http" {
        return false;
    }

    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => false,
        Some(host) => !host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => true,
    }
}

fn classify(error: reqwest::Error, request: &HttpRequest) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout(request.timeout)
    } else {
        HttpError::NetworkError(error)
    }
}
