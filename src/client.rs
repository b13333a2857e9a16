use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::Result;

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Performs a GET and hands back status and body. Non-2xx statuses are
/// responses, not errors.
pub trait Fetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;
}

pub struct DeviceClientBuilder {
    request_timeout: Option<Duration>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<PathBuf>,
}

impl DeviceClientBuilder {
    pub fn new() -> Self {
        Self {
            request_timeout: None,
            log_mode: None,
            log_path: None,
        }
    }

    /// Transport-level timeout. The validation step applies its own bound on
    /// top of this.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<PathBuf>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<DeviceClient> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, path)?)),
            _ => None,
        };

        Ok(DeviceClient { http, logger })
    }
}

impl Default for DeviceClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Fetcher`] backed by `reqwest`, optionally recording every exchange.
pub struct DeviceClient {
    http: reqwest::Client,
    logger: Option<Mutex<MessageLogger>>,
}

impl DeviceClient {
    pub fn builder() -> DeviceClientBuilder {
        DeviceClientBuilder::new()
    }

    pub fn new() -> Result<Self> {
        DeviceClientBuilder::new().build()
    }

    async fn send(&self, url: &str) -> Result<HttpResponse> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!(status, bytes = body.len(), "device responded");
        Ok(HttpResponse { status, body })
    }

    fn with_logger(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(ref logger) = self.logger {
            match logger.lock() {
                Ok(mut guard) => f(&mut guard),
                Err(_) => warn!("message logger poisoned, skipping entry"),
            }
        }
    }
}

impl Fetcher for DeviceClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url = %url, "GET");
        self.with_logger(|l| l.log_request("GET", url));

        let result = self.send(url).await;
        match &result {
            Ok(resp) => self.with_logger(|l| l.log_response(url, resp.status, &resp.body)),
            Err(e) => self.with_logger(|l| l.log_failure(url, &e.to_string())),
        }
        result
    }
}
